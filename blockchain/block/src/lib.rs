/*
    Block level commitments and checks which need no state transition: the header hash, the extrinsic hash the header
    commits to, the seal and entropy-source VRF signatures, and the helpers a block author uses to produce them.
*/

pub mod header;
pub mod extrinsic;

pub use extrinsic::extrinsic_hash;
pub use header::{author_header, header_hash, seal_context, seal_verify};
