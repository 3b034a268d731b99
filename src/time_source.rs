//! Read-only variable reporting the current time.

use crate::address_space::{DataSource, DataValue, NodeId, NumericRange, StatusCode, Variant};
use chrono::Utc;

/// Answers every read with the wall-clock time at the moment of the read.
///
/// Holds no state and has no write side.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComputedTimeSource;

impl DataSource for ComputedTimeSource {
    fn read(
        &self,
        _node_id: &NodeId,
        source_timestamp: bool,
        range: Option<&NumericRange>,
    ) -> Result<DataValue, StatusCode> {
        // Scalar value: any index range is invalid.
        if range.is_some() {
            return Ok(DataValue::from_status(StatusCode::BAD_INDEX_RANGE_INVALID));
        }
        let now = Utc::now();
        let mut value = DataValue::from_value(Variant::DateTime(now));
        if source_timestamp {
            value.source_timestamp = Some(now);
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time_of(value: &DataValue) -> chrono::DateTime<Utc> {
        match value.value {
            Some(Variant::DateTime(t)) => t,
            ref other => panic!("expected DateTime, got {:?}", other),
        }
    }

    #[test]
    fn test_range_request_is_rejected_without_value() {
        let range: NumericRange = "0".parse().unwrap();
        let value = ComputedTimeSource
            .read(&NodeId::null(), true, Some(&range))
            .unwrap();
        assert_eq!(value.status(), StatusCode::BAD_INDEX_RANGE_INVALID);
        assert!(value.value.is_none());
        assert!(value.source_timestamp.is_none());
    }

    #[test]
    fn test_source_timestamp_matches_value() {
        let value = ComputedTimeSource.read(&NodeId::null(), true, None).unwrap();
        assert_eq!(value.status(), StatusCode::GOOD);
        assert_eq!(value.source_timestamp, Some(time_of(&value)));

        let value = ComputedTimeSource.read(&NodeId::null(), false, None).unwrap();
        assert!(value.source_timestamp.is_none());
    }

    #[test]
    fn test_repeated_reads_do_not_go_backwards() {
        let mut last = time_of(&ComputedTimeSource.read(&NodeId::null(), false, None).unwrap());
        for _ in 0..100 {
            let now = time_of(&ComputedTimeSource.read(&NodeId::null(), false, None).unwrap());
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn test_writes_are_rejected() {
        let result = ComputedTimeSource.write(
            &NodeId::null(),
            &DataValue::from_value(Variant::DateTime(Utc::now())),
        );
        assert_eq!(result, Err(StatusCode::BAD_NOT_WRITABLE));
    }
}
