use jam_types::{
    ExportsRoot, Gas, OpaqueHash, ReadError, RefineContext, RefineLoad, ReportedPackage, SegmentRootLookupItem, ServiceId,
    TimeSlot, WorkExecError, WorkExecResult, WorkPackageHash, WorkPackageSpec, WorkReport, WorkResult,
};
use crate::{BytesReader, Decode, DecodeLen, Encode, EncodeLen};
use crate::generic_codec::{decode_unsigned, encode_unsigned};

impl Encode for WorkReport {

    fn encode(&self) -> Vec<u8> {

        let mut work_report_blob: Vec<u8> = Vec::with_capacity(512);

        self.package_spec.encode_to(&mut work_report_blob);
        self.context.encode_to(&mut work_report_blob);
        encode_unsigned(self.core_index as usize).encode_to(&mut work_report_blob);
        self.authorizer_hash.encode_to(&mut work_report_blob);
        encode_unsigned(self.auth_gas_used as usize).encode_to(&mut work_report_blob);
        self.auth_output.encode_len().encode_to(&mut work_report_blob);
        self.segment_root_lookup.encode_len().encode_to(&mut work_report_blob);
        self.results.encode_len().encode_to(&mut work_report_blob);

        work_report_blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for WorkReport {

    fn decode(work_report: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(WorkReport {
            package_spec: WorkPackageSpec::decode(work_report)?,
            context: RefineContext::decode(work_report)?,
            core_index: u16::try_from(decode_unsigned(work_report)?).map_err(|_| ReadError::ConversionError)?,
            authorizer_hash: OpaqueHash::decode(work_report)?,
            auth_gas_used: decode_unsigned(work_report)? as Gas,
            auth_output: Vec::<u8>::decode_len(work_report)?,
            segment_root_lookup: Vec::<SegmentRootLookupItem>::decode_len(work_report)?,
            results: Vec::<WorkResult>::decode_len(work_report)?,
        })
    }
}

impl Encode for WorkPackageSpec {

    fn encode(&self) -> Vec<u8> {

        let mut blob = Vec::with_capacity(102);

        self.hash.encode_to(&mut blob);
        self.length.encode_to(&mut blob);
        self.erasure_root.encode_to(&mut blob);
        self.exports_root.encode_to(&mut blob);
        self.exports_count.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for WorkPackageSpec {

    fn decode(blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(WorkPackageSpec {
            hash: WorkPackageHash::decode(blob)?,
            length: u32::decode(blob)?,
            erasure_root: OpaqueHash::decode(blob)?,
            exports_root: ExportsRoot::decode(blob)?,
            exports_count: u16::decode(blob)?,
        })
    }
}

impl Encode for RefineContext {

    fn encode(&self) -> Vec<u8> {

        let mut refine_blob: Vec<u8> = Vec::with_capacity(133 + 32 * self.prerequisites.len());

        self.anchor.encode_to(&mut refine_blob);
        self.state_root.encode_to(&mut refine_blob);
        self.beefy_root.encode_to(&mut refine_blob);
        self.lookup_anchor.encode_to(&mut refine_blob);
        self.lookup_anchor_slot.encode_to(&mut refine_blob);
        self.prerequisites.encode_len().encode_to(&mut refine_blob);

        refine_blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for RefineContext {

    fn decode(refine_blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(RefineContext {
            anchor: OpaqueHash::decode(refine_blob)?,
            state_root: OpaqueHash::decode(refine_blob)?,
            beefy_root: OpaqueHash::decode(refine_blob)?,
            lookup_anchor: OpaqueHash::decode(refine_blob)?,
            lookup_anchor_slot: TimeSlot::decode(refine_blob)?,
            prerequisites: Vec::<OpaqueHash>::decode_len(refine_blob)?,
        })
    }
}

impl Encode for SegmentRootLookupItem {

    fn encode(&self) -> Vec<u8> {

        let mut item = Vec::with_capacity(64);

        self.work_package_hash.encode_to(&mut item);
        self.segment_tree_root.encode_to(&mut item);

        item
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for SegmentRootLookupItem {

    fn decode(item: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(SegmentRootLookupItem {
            work_package_hash: OpaqueHash::decode(item)?,
            segment_tree_root: OpaqueHash::decode(item)?,
        })
    }
}

impl Encode for ReportedPackage {

    fn encode(&self) -> Vec<u8> {

        let mut blob = Vec::with_capacity(64);

        self.work_package_hash.encode_to(&mut blob);
        self.segment_tree_root.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for ReportedPackage {

    fn decode(blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(ReportedPackage {
            work_package_hash: WorkPackageHash::decode(blob)?,
            segment_tree_root: OpaqueHash::decode(blob)?,
        })
    }
}

impl Encode for WorkExecResult {

    fn encode(&self) -> Vec<u8> {

        match self {
            WorkExecResult::Ok(output) => {
                let mut blob = vec![0u8];
                output.encode_len().encode_to(&mut blob);
                blob
            }
            WorkExecResult::Error(error) => vec![*error as u8],
        }
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for WorkExecResult {

    fn decode(blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(match blob.read_byte()? {
            0 => WorkExecResult::Ok(Vec::<u8>::decode_len(blob)?),
            1 => WorkExecResult::Error(WorkExecError::OutOfGas),
            2 => WorkExecResult::Error(WorkExecError::Panic),
            3 => WorkExecResult::Error(WorkExecError::BadNumberExports),
            4 => WorkExecResult::Error(WorkExecError::BadCode),
            5 => WorkExecResult::Error(WorkExecError::CodeOversize),
            _ => return Err(ReadError::InvalidData),
        })
    }
}

impl Encode for WorkResult {

    fn encode(&self) -> Vec<u8> {

        let mut blob: Vec<u8> = Vec::with_capacity(128);

        self.service.encode_to(&mut blob);
        self.code_hash.encode_to(&mut blob);
        self.payload_hash.encode_to(&mut blob);
        self.gas.encode_to(&mut blob);
        self.result.encode_to(&mut blob);
        self.refine_load.encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for WorkResult {

    fn decode(blob: &mut BytesReader) -> Result<Self, ReadError> {

        Ok(WorkResult {
            service: ServiceId::decode(blob)?,
            code_hash: OpaqueHash::decode(blob)?,
            payload_hash: OpaqueHash::decode(blob)?,
            gas: Gas::decode(blob)?,
            result: WorkExecResult::decode(blob)?,
            refine_load: RefineLoad::decode(blob)?,
        })
    }
}

impl Encode for RefineLoad {

    fn encode(&self) -> Vec<u8> {

        let mut blob: Vec<u8> = Vec::with_capacity(16);

        encode_unsigned(self.gas_used as usize).encode_to(&mut blob);
        encode_unsigned(self.imports as usize).encode_to(&mut blob);
        encode_unsigned(self.extrinsic_count as usize).encode_to(&mut blob);
        encode_unsigned(self.extrinsic_size as usize).encode_to(&mut blob);
        encode_unsigned(self.exports as usize).encode_to(&mut blob);

        blob
    }

    fn encode_to(&self, into: &mut Vec<u8>) {
        into.extend_from_slice(&self.encode());
    }
}

impl Decode for RefineLoad {

    fn decode(blob: &mut BytesReader) -> Result<Self, ReadError> {

        let narrow = |value: usize| u16::try_from(value).map_err(|_| ReadError::ConversionError);

        Ok(RefineLoad {
            gas_used: decode_unsigned(blob)? as Gas,
            imports: narrow(decode_unsigned(blob)?)?,
            extrinsic_count: narrow(decode_unsigned(blob)?)?,
            extrinsic_size: u32::try_from(decode_unsigned(blob)?).map_err(|_| ReadError::ConversionError)?,
            exports: narrow(decode_unsigned(blob)?)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use constants::ProtocolConfig;
    use crate::decode_all;

    #[test]
    fn work_report_round_trips() {
        let config = ProtocolConfig::tiny();
        let report = WorkReport {
            core_index: 1,
            auth_gas_used: 300,
            auth_output: vec![1, 2],
            segment_root_lookup: vec![SegmentRootLookupItem { work_package_hash: [1; 32], segment_tree_root: [2; 32] }],
            results: vec![
                WorkResult {
                    service: 7,
                    gas: 1_000,
                    result: WorkExecResult::Ok(vec![0xaa; 3]),
                    refine_load: RefineLoad { gas_used: 200, imports: 1, extrinsic_count: 2, extrinsic_size: 70_000, exports: 3 },
                    ..Default::default()
                },
                WorkResult { service: 8, result: WorkExecResult::Error(WorkExecError::Panic), ..Default::default() },
            ],
            ..Default::default()
        };
        assert_eq!(report, decode_all::<WorkReport>(&report.encode(), &config).unwrap());
    }

    #[test]
    fn exec_result_tags() {
        assert_eq!(vec![0, 2, 9, 9], WorkExecResult::Ok(vec![9, 9]).encode());
        assert_eq!(vec![1], WorkExecResult::Error(WorkExecError::OutOfGas).encode());
        assert_eq!(vec![5], WorkExecResult::Error(WorkExecError::CodeOversize).encode());
        let config = ProtocolConfig::tiny();
        assert_eq!(Err(ReadError::InvalidData), decode_all::<WorkExecResult>(&[6], &config));
    }
}
