use jam_types::{BandersnatchRingVrfSignature, ReadError, Safrole, Ticket, TicketAttempt, TicketsOrKeys};
use crate::{BytesReader, Decode, Encode};

impl Encode for Ticket {

    fn encode(&self) -> Vec<u8> {

        let mut blob = Vec::with_capacity(785);

        self.attempt.encode_to(&mut blob);
        self.signature.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for Ticket {

    fn decode(blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(Ticket {
            attempt: TicketAttempt::decode(blob)?,
            signature: BandersnatchRingVrfSignature::decode(blob)?,
        })
    }
}

// Tag 0 carries an epoch of tickets, tag 1 the fallback keys
impl Encode for TicketsOrKeys {

    fn encode(&self) -> Vec<u8> {

        let mut encoded = Vec::new();

        match self {
            TicketsOrKeys::Tickets(tickets) => {
                encoded.push(0);
                tickets.encode_to(&mut encoded);
            }
            TicketsOrKeys::Keys(keys) => {
                encoded.push(1);
                keys.encode_to(&mut encoded);
            }
        }

        encoded
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Encode for Safrole {

    fn encode(&self) -> Vec<u8> {

        let mut blob = Vec::new();

        self.next_validators.encode_to(&mut blob);
        self.ring_commitment.encode_to(&mut blob);
        self.tickets_or_keys.encode_to(&mut blob);
        self.ticket_accumulator.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use constants::ProtocolConfig;
    use jam_types::{BoundedVec, TicketBody};

    #[test]
    fn tickets_or_keys_tags() {
        let config = ProtocolConfig::tiny();
        let keys = TicketsOrKeys::Keys(BoundedVec::filled(&config, [7; 32]));
        let blob = keys.encode();
        assert_eq!(1, blob[0]);
        assert_eq!(1 + 12 * 32, blob.len());

        let tickets = TicketsOrKeys::Tickets(BoundedVec::filled(&config, TicketBody { id: [1; 32], attempt: 2 }));
        let blob = tickets.encode();
        assert_eq!(0, blob[0]);
        assert_eq!(1 + 12 * 33, blob.len());
    }

    #[test]
    fn safrole_layout() {
        let config = ProtocolConfig::tiny();
        let safrole = Safrole::new(&config);
        // next validators, ring commitment, sealer keys, empty accumulator with its length
        assert_eq!(6 * 336 + 144 + (1 + 12 * 32) + 1, safrole.encode().len());
    }
}
