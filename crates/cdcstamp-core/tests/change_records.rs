use std::error::Error;

use cdcstamp_core::{
    to_cloud_timestamp, CloudTimestamp, InvalidInputError, NormalizerConfig, PipelineInstant,
    TimestampNormalizer, ToInstant,
};
use prost_types::Timestamp;

type TestResult = Result<(), Box<dyn Error>>;

/// Shape of a decoded change-stream mutation as the pipeline sees it.
struct ChangeRecord {
    row_key: &'static str,
    commit_timestamp: Option<Timestamp>,
}

fn record(row_key: &'static str, seconds: i64, nanos: i32) -> ChangeRecord {
    ChangeRecord {
        row_key,
        commit_timestamp: Some(Timestamp { seconds, nanos }),
    }
}

#[test]
fn orders_records_and_writes_checkpoint() -> TestResult {
    let normalizer = TimestampNormalizer::default();
    let records = vec![
        record("c", 1_700_000_002, 0),
        record("a", 1_700_000_000, 250_000_000),
        record("b", 1_700_000_000, 250_999_999),
    ];

    let mut normalized = records
        .iter()
        .map(|rec| Ok((rec.commit_timestamp.to_instant_with(&normalizer)?, rec.row_key)))
        .collect::<Result<Vec<(PipelineInstant, &str)>, InvalidInputError>>()?;
    normalized.sort();

    let keys: Vec<&str> = normalized.iter().map(|(_, key)| *key).collect();
    assert_eq!(keys, ["a", "b", "c"]);
    assert_eq!(normalized[0].0, normalized[1].0);

    let (watermark, _) = normalized[normalized.len() - 1];
    let checkpoint = normalizer.instant_to_cloud(watermark)?;
    assert_eq!(checkpoint.to_string(), "2023-11-14T22:13:22Z");

    let restored: CloudTimestamp = checkpoint.to_string().parse()?;
    assert_eq!(normalizer.cloud_to_instant(&restored), watermark);
    Ok(())
}

#[test]
fn missing_commit_timestamp_is_surfaced_to_caller() {
    let normalizer = TimestampNormalizer::default();
    let rec = ChangeRecord {
        row_key: "orphan",
        commit_timestamp: None,
    };

    let result = normalizer.optional_wire_to_instant(rec.commit_timestamp.as_ref());
    assert_eq!(result, Err(InvalidInputError::Missing), "row {}", rec.row_key);
}

#[test]
fn configured_normalizer_accepts_unnormalized_nanos() -> TestResult {
    let config = NormalizerConfig::from_toml_str("nanos_policy = \"normalize\"\n")?;
    let lenient = TimestampNormalizer::new(&config);
    let strict = TimestampNormalizer::default();
    let rec = record("late", 59, 1_250_000_000);
    let ts = rec.commit_timestamp.as_ref().ok_or("missing timestamp")?;

    assert_eq!(lenient.wire_to_instant(ts)?.epoch_millis(), 60_250);
    assert!(matches!(
        strict.wire_to_instant(ts),
        Err(InvalidInputError::NanosOutOfRange { .. })
    ));
    Ok(())
}

#[test]
fn wire_and_database_paths_agree_on_millisecond_inputs() -> TestResult {
    let normalizer = TimestampNormalizer::default();
    for (seconds, nanos) in [(0, 0), (-1, 500_000_000), (1_700_000_000, 7_000_000)] {
        let proto = Timestamp { seconds, nanos };
        let cloud = CloudTimestamp::from_proto(&proto)?;
        assert_eq!(
            normalizer.wire_to_instant(&proto)?,
            normalizer.cloud_to_instant(&cloud)
        );
        assert_eq!(to_cloud_timestamp(normalizer.cloud_to_instant(&cloud))?, cloud);
    }
    Ok(())
}
