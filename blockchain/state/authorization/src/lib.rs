/*
    We define the type of authorizer hashes which, together with a queue per core, track the authorization requirement
    which work done on a core must satisfy at the time of being reported on-chain. The pool holds the authorizers a
    report may currently claim; each block, the authorizers consumed by the guarantees are dropped from their core's
    pool and the queue entry for the current slot is appended, evicting the oldest one when the pool is full.
*/

use constants::ProtocolConfig;
use jam_types::{AuthPools, AuthQueues, AuthorizationError, CodeAuthorizer, CoreIndex, Guarantee, TimeSlot};
use utils::print_hash;

/// The authorizer each guarantee in the block consumes, tagged with its core.
pub fn used_authorizers(guarantees: &[Guarantee]) -> Vec<CodeAuthorizer> {
    guarantees
        .iter()
        .map(|guarantee| CodeAuthorizer { core: guarantee.report.core_index, auth_hash: guarantee.report.authorizer_hash })
        .collect()
}

pub fn process(
    _config: &ProtocolConfig,
    auth_pools: &AuthPools,
    auth_queues: &AuthQueues,
    post_tau: TimeSlot,
    used: &[CodeAuthorizer],
) -> Result<AuthPools, AuthorizationError> {

    log::debug!("Process authorization pools for slot {post_tau}");
    let mut new_pools = auth_pools.clone();

    for (core, (pool, queue)) in new_pools.iter_mut().zip(auth_queues.iter()).enumerate() {

        if queue.is_empty() {
            continue;
        }

        // The authorizers used by this block's reports leave the pool
        for used_auth in used.iter().filter(|used_auth| used_auth.core as usize == core) {
            let index = pool
                .iter()
                .position(|auth| *auth == used_auth.auth_hash)
                .ok_or(AuthorizationError::InvalidReportAuthorizer(core as CoreIndex))?;
            pool.remove(index)?;
            log::trace!("Authorizer {} consumed on core {core}", print_hash!(used_auth.auth_hash));
        }

        let new_item = queue[post_tau as usize % queue.len()];
        pool.push_evicting(new_item);
    }

    Ok(new_pools)
}
