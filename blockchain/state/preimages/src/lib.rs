/*
    Preimages are static data which is presently being requested to be available for workloads to be able to fetch on
    demand. The preimages extrinsic is a sequence of pairs of service indices and data, which must be ordered and
    without duplicates. Every blob must have been solicited by its service: the availability record keyed by its hash
    and length exists and is still empty. Preimages which accumulation of this same block made useless are dropped.
*/

use jam_types::{OpaqueHash, Preimage, PreimagesError, ServiceAccounts, ServiceId, TimeSlot};
use utils::common::blake2;
use utils::print_hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreimageUpdate {
    pub service: ServiceId,
    pub hash: OpaqueHash,
    pub blob: Vec<u8>,
    pub length: u32,
    pub timeslot: TimeSlot,
}

/// Checks the extrinsic against the state prior to the block and returns the preimages still requested by the
/// services after accumulation.
pub fn process<P, S>(prior: &P, post: &S, post_tau: TimeSlot, preimages: &[Preimage]) -> Result<Vec<PreimageUpdate>, PreimagesError>
where
    P: ServiceAccounts,
    S: ServiceAccounts,
{
    if preimages.is_empty() {
        log::debug!("No preimages to process");
        return Ok(Vec::new());
    }

    let hashed: Vec<(ServiceId, OpaqueHash)> = preimages.iter().map(|preimage| (preimage.requester, blake2(&preimage.blob))).collect();

    // Ordered by service index then by hash, without duplicates
    if !utils::common::is_sorted_and_unique(&hashed) {
        log::error!("Preimages not sorted or unique");
        return Err(PreimagesError::PreimagesNotSorted);
    }

    let mut updates = Vec::with_capacity(preimages.len());

    for (preimage, (service, hash)) in preimages.iter().zip(hashed) {

        let length = preimage.blob.len() as u32;
        log::debug!("Preimage of service {service}: length {length}, hash 0x{}", print_hash!(hash));

        if prior.service_info(service).is_none() {
            log::error!("Requester {service} not found");
            return Err(PreimagesError::InvalidServiceIndex(service));
        }

        if prior.preimage(service, &hash).is_some() {
            log::error!("Preimage 0x{} already provided", print_hash!(hash));
            return Err(PreimagesError::DuplicatedPreimage);
        }

        match prior.preimage_info(service, &hash, length) {
            None => {
                log::error!("Preimage 0x{} was not requested", print_hash!(hash));
                return Err(PreimagesError::PreimageNotSolicited);
            }
            Some(slots) if !slots.is_empty() => {
                log::error!("Preimage 0x{} already available", print_hash!(hash));
                return Err(PreimagesError::DuplicatedPreimage);
            }
            Some(_) => {}
        }

        // Disregard, without prejudice, preimages which are no longer useful after accumulation
        if !post.preimage_info(service, &hash, length).map_or(false, |slots| slots.is_empty()) {
            log::debug!("Preimage 0x{} no longer requested", print_hash!(hash));
            continue;
        }

        updates.push(PreimageUpdate { service, hash, blob: preimage.blob.clone(), length, timeslot: post_tau });
    }

    Ok(updates)
}

/// Stores every update's blob and marks it available from its timeslot.
pub fn apply_updates<S: ServiceAccounts>(services: &mut S, updates: &[PreimageUpdate]) {
    for update in updates {
        services.set_preimage(update.service, update.hash, Some(update.blob.clone()));
        services.set_preimage_info(update.service, update.hash, update.length, Some(vec![update.timeslot]));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use jam_types::{ServiceInfo, Services};

    fn services_requesting(service: ServiceId, blobs: &[&[u8]]) -> Services {
        let mut services = Services::default();
        services.set_service_info(service, ServiceInfo::default());
        for blob in blobs {
            services.set_preimage_info(service, blake2(blob), blob.len() as u32, Some(vec![]));
        }
        services
    }

    fn sorted(mut preimages: Vec<Preimage>) -> Vec<Preimage> {
        preimages.sort_by_key(|preimage| (preimage.requester, blake2(&preimage.blob)));
        preimages
    }

    #[test]
    fn requested_preimages_are_stored() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut services = services_requesting(3, &[b"abc", b"defg"]);
        let preimages = sorted(vec![Preimage { requester: 3, blob: b"abc".to_vec() }, Preimage { requester: 3, blob: b"defg".to_vec() }]);

        let updates = process(&services, &services, 42, &preimages).unwrap();
        assert_eq!(2, updates.len());

        apply_updates(&mut services, &updates);
        assert_eq!(Some(b"abc".to_vec()), services.preimage(3, &blake2(b"abc")));
        assert_eq!(Some(vec![42]), services.preimage_info(3, &blake2(b"defg"), 4));

        // Now provided, so a second submission is a duplicate
        let result = process(&services, &services, 43, &preimages[..1]);
        assert_eq!(Err(PreimagesError::DuplicatedPreimage), result);
    }

    #[test]
    fn ordering_and_solicitation() {
        let services = services_requesting(3, &[b"abc", b"defg"]);
        let mut preimages = sorted(vec![Preimage { requester: 3, blob: b"abc".to_vec() }, Preimage { requester: 3, blob: b"defg".to_vec() }]);
        preimages.swap(0, 1);
        assert_eq!(Err(PreimagesError::PreimagesNotSorted), process(&services, &services, 1, &preimages));

        let duplicated = vec![Preimage { requester: 3, blob: b"abc".to_vec() }; 2];
        assert_eq!(Err(PreimagesError::PreimagesNotSorted), process(&services, &services, 1, &duplicated));

        let unsolicited = vec![Preimage { requester: 3, blob: b"xyz".to_vec() }];
        assert_eq!(Err(PreimagesError::PreimageNotSolicited), process(&services, &services, 1, &unsolicited));

        let unknown = vec![Preimage { requester: 4, blob: b"abc".to_vec() }];
        assert_eq!(Err(PreimagesError::InvalidServiceIndex(4)), process(&services, &services, 1, &unknown));
    }

    #[test]
    fn preimage_forgotten_by_accumulation_is_dropped() {
        let prior = services_requesting(3, &[b"abc"]);
        let mut post = prior.clone();
        post.set_preimage_info(3, blake2(b"abc"), 3, None);

        let preimages = vec![Preimage { requester: 3, blob: b"abc".to_vec() }];
        assert!(process(&prior, &post, 1, &preimages).unwrap().is_empty());
    }
}
