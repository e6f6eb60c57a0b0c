#[cfg(test)]
mod tests {

    use crate::chain::{init_logger, Chain, RING};
    use constants::node::XT_TICKET_SEAL;
    use jam_types::{BandersnatchPublic, Extrinsic, RuntimeError, SafroleError, Ticket};

    // Tickets of the given validators, ordered by their identifiers
    fn tickets(chain: &Chain, signers: &[usize], attempt: u8) -> Vec<Ticket> {
        let keys: Vec<BandersnatchPublic> = chain.state.safrole.next_validators.iter().map(|v| v.bandersnatch).collect();
        let input = [XT_TICKET_SEAL, &chain.state.entropy.0[2][..], &[attempt][..]].concat();

        let mut tickets: Vec<([u8; 32], Ticket)> = signers
            .iter()
            .map(|signer| {
                let prover = &chain.provers[*signer];
                let id = prover.vrf_output(&input).unwrap();
                let signature = prover.ring_vrf_sign(&RING, &keys, *signer, &input, &[]).unwrap();
                (id, Ticket { attempt, signature })
            })
            .collect();
        tickets.sort_by_key(|(id, _)| *id);
        tickets.into_iter().map(|(_, ticket)| ticket).collect()
    }

    #[test]
    fn submitted_tickets_enter_the_accumulator() {
        init_logger();
        let mut chain = Chain::genesis();
        let submitted = tickets(&chain, &[0, 3], 1);
        let block = chain.author(1, Extrinsic { tickets: submitted.clone(), ..Default::default() });
        chain.import(&block).unwrap();

        let accumulator = &chain.state.safrole.ticket_accumulator;
        assert_eq!(2, accumulator.len());
        assert!(accumulator[0].id < accumulator[1].id);
        assert!(accumulator.iter().all(|ticket| ticket.attempt == 1));
        assert_eq!(2, chain.state.statistics.curr[block.header.unsigned.author_index as usize].tickets);

        // The same tickets can't be submitted twice
        let block = chain.author(2, Extrinsic { tickets: submitted[..1].to_vec(), ..Default::default() });
        assert!(matches!(chain.apply(&block), Err(RuntimeError::Safrole(SafroleError::ExtrinsicsNotUnique))));
    }

    #[test]
    fn tickets_close_with_the_submission_period() {
        let mut chain = Chain::genesis();
        let slot = chain.config.ticket_submission_end;
        let block = chain.author(slot, Extrinsic { tickets: tickets(&chain, &[2], 0), ..Default::default() });
        assert!(matches!(chain.apply(&block), Err(RuntimeError::Safrole(SafroleError::ExtrinsicsNotAllowed))));

        let block = chain.author(slot, Extrinsic::default());
        chain.import(&block).unwrap();
        assert!(chain.state.safrole.ticket_accumulator.is_empty());
    }
}
