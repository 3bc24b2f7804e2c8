use std::io::{Cursor, Write};

use bootcheck_regs::{Register, RegisterFile, RegsError};

use super::*;

const BOOT_TRACE: &str = "\
pc:0000,sp:0000
pc:0003,sp:fffe
pc:0004,af:0080
pc:0007,hl:9fff
";

fn reader(text: &str, config: TraceConfig) -> GoldenTraceReader<Cursor<Vec<u8>>> {
    GoldenTraceReader::from_reader(Cursor::new(text.as_bytes().to_vec()), config)
}

fn pcs(text: &str, config: TraceConfig) -> Vec<u16> {
    reader(text, config)
        .map(|record| record.unwrap().pc())
        .collect()
}

#[test]
fn test_reads_all_records_in_order() {
    assert_eq!(
        pcs(BOOT_TRACE, TraceConfig::default()),
        vec![0x0000, 0x0003, 0x0004, 0x0007]
    );
}

#[test]
fn test_records_are_incremental() {
    let mut golden = RegisterFile::new();
    for record in reader(BOOT_TRACE, TraceConfig::default()) {
        golden.apply(&record.unwrap().update);
    }
    assert_eq!(
        golden.to_string(),
        "af:0x0080 bc:0x0000 de:0x0000 hl:0x9fff sp:0xfffe pc:0x0007"
    );
}

#[test]
fn test_record_line_numbers() {
    let lines: Vec<_> = reader(BOOT_TRACE, TraceConfig::new(1, Some(2)))
        .map(|record| record.unwrap().line)
        .collect();
    assert_eq!(lines, vec![2, 3]);
}

#[test]
fn test_skip_and_cap() {
    assert_eq!(pcs(BOOT_TRACE, TraceConfig::new(1, Some(1))), vec![0x0003]);
    assert_eq!(pcs(BOOT_TRACE, TraceConfig::new(0, Some(2))), vec![0x0000, 0x0003]);
    assert_eq!(pcs(BOOT_TRACE, TraceConfig::new(3, None)), vec![0x0007]);
    assert!(pcs(BOOT_TRACE, TraceConfig::new(10, None)).is_empty());
    assert!(pcs(BOOT_TRACE, TraceConfig::new(0, Some(0))).is_empty());
}

#[test]
fn test_cap_stops_before_reading_further() {
    // The bad line is never reached.
    let text = "pc:0100\npc:0101\nthis is not a record\n";
    let mut reader = reader(text, TraceConfig::new(0, Some(2)));
    assert!(reader.next().unwrap().is_ok());
    assert!(reader.next().unwrap().is_ok());
    assert!(reader.next().is_none());
    assert_eq!(reader.emitted(), 2);
    assert_eq!(reader.line(), 2);
}

#[test]
fn test_skipped_lines_are_not_parsed() {
    let text = "af,bc,de,hl,sp,pc\npc:0100\n";
    assert_eq!(pcs(text, TraceConfig::new(1, None)), vec![0x0100]);
}

#[test]
fn test_unknown_columns_are_ignored() {
    let text = "pc:0100,ime:1,cycles:24\n";
    let record = reader(text, TraceConfig::default()).next().unwrap().unwrap();
    assert_eq!(record.update.iter().collect::<Vec<_>>(), vec![(Register::Pc, 0x0100)]);
}

#[test]
fn test_crlf_and_prefixes() {
    let text = "pc:0x0100,af:0X01B0\r\npc:0101\r\n";
    assert_eq!(pcs(text, TraceConfig::default()), vec![0x0100, 0x0101]);
}

#[test]
fn test_missing_colon_is_malformed() {
    let mut reader = reader("af-00ff\n", TraceConfig::default());
    let err = reader.next().unwrap().unwrap_err();
    assert!(matches!(
        err,
        TraceError::MalformedGoldenRecord {
            line: 1,
            defect: RecordDefect::Field(RegsError::MalformedPair(ref f)),
        } if f == "af-00ff"
    ));
    assert!(reader.next().is_none());
}

#[test]
fn test_malformed_record_after_good_ones() {
    let text = "pc:0100\npc:0101,af:01g0\npc:0102\n";
    let results: Vec<_> = reader(text, TraceConfig::default()).collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(TraceError::MalformedGoldenRecord {
            line: 2,
            defect: RecordDefect::Field(RegsError::InvalidHex(_)),
        })
    ));
}

#[test]
fn test_out_of_range_value_is_malformed() {
    let err = reader("pc:10000\n", TraceConfig::default())
        .next()
        .unwrap()
        .unwrap_err();
    assert!(matches!(
        err,
        TraceError::MalformedGoldenRecord {
            defect: RecordDefect::Field(RegsError::OutOfRange(_)),
            ..
        }
    ));
}

#[test]
fn test_blank_line_is_malformed() {
    let results: Vec<_> = reader("pc:0100\n\npc:0101\n", TraceConfig::default()).collect();
    assert!(matches!(
        results[1],
        Err(TraceError::MalformedGoldenRecord {
            line: 2,
            defect: RecordDefect::Empty,
        })
    ));
}

#[test]
fn test_record_without_pc_is_malformed() {
    let err = reader("af:01b0\n", TraceConfig::default())
        .next()
        .unwrap()
        .unwrap_err();
    assert!(matches!(
        err,
        TraceError::MalformedGoldenRecord {
            defect: RecordDefect::MissingPc,
            ..
        }
    ));
}

#[test]
fn test_invalid_utf8_is_read_error() {
    let data = b"pc:0100\n\xff\xfe\n".to_vec();
    let results: Vec<_> =
        GoldenTraceReader::from_reader(Cursor::new(data), TraceConfig::default()).collect();
    assert!(matches!(results[1], Err(TraceError::Read { line: 2, .. })));
}

#[test]
fn test_open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.txt");
    let err = GoldenTraceReader::open(&path, TraceConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err, TraceError::ResourceUnavailable { ref path, .. } if path.ends_with("missing.txt")));
}

#[test]
fn test_open_directory_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let err = GoldenTraceReader::open(dir.path(), TraceConfig::default())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        TraceError::ResourceUnavailable { ref source, .. }
            if source.kind() == std::io::ErrorKind::IsADirectory
    ));
}

#[test]
fn test_window_caps_and_skips() {
    assert_eq!(TraceConfig::default().window(40), 40);
    assert_eq!(TraceConfig::new(0, Some(501)).window(40), 40);
    assert_eq!(TraceConfig::new(1, Some(50)).window(200), 50);
    assert_eq!(TraceConfig::new(1, None).window(0), 0);
}

#[test]
fn test_count_records_of_short_trace() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"pc:0000\npc:0003\nbogus\n").unwrap();

    let count = count_records(file.path(), TraceConfig::new(1, Some(501))).unwrap();
    assert_eq!(count, 2);
    assert!(matches!(
        count_records(&file.path().join("nope"), TraceConfig::default()),
        Err(TraceError::ResourceUnavailable { .. })
    ));
}

#[test]
fn test_open_plain_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(BOOT_TRACE.as_bytes()).unwrap();

    let reader = GoldenTraceReader::open(file.path(), TraceConfig::new(0, Some(3))).unwrap();
    let pcs: Vec<_> = reader.map(|r| r.unwrap().pc()).collect();
    assert_eq!(pcs, vec![0x0000, 0x0003, 0x0004]);
}

#[test]
fn test_open_zstd_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("boot_states.txt.zst");
    let compressed = zstd::encode_all(BOOT_TRACE.as_bytes(), 3).unwrap();
    std::fs::write(&path, compressed).unwrap();

    let reader = GoldenTraceReader::open(&path, TraceConfig::default()).unwrap();
    let pcs: Vec<_> = reader.map(|r| r.unwrap().pc()).collect();
    assert_eq!(pcs, vec![0x0000, 0x0003, 0x0004, 0x0007]);
}
