use super::*;
use crate::error::DmapError;

fn registry() -> ContentCodeRegistry {
    ContentCodeRegistry::default()
}

#[test]
fn test_parse_string_exact_length() {
    let mut writer = DmapWriter::new();
    writer.string(b"minm", "Test Song");
    let buf = writer.finish();

    // Code (4) + length (4) + "Test Song" (9)
    assert_eq!(buf.len(), 17);

    let items = parse(&buf, &registry()).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_str(), Some("Test Song"));
}

#[test]
fn test_parse_nested_containers() {
    let mut writer = DmapWriter::new();
    writer.container(b"mlcl", |listing| {
        listing.container(b"mlit", |item| {
            item.u32(b"miid", 7);
            item.string(b"minm", "First");
        });
        listing.container(b"mlit", |item| {
            item.u32(b"miid", 8);
            item.string(b"minm", "Second");
        });
    });
    let buf = writer.finish();

    let items = parse(&buf, &registry()).unwrap();
    let listing = find_root(&items, b"mlcl").unwrap();
    let entries: Vec<_> = listing.children_with(b"mlit").collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].child(b"miid").unwrap().as_u32(), Some(7));
    assert_eq!(entries[1].child(b"minm").unwrap().as_str(), Some("Second"));
}

#[test]
fn test_parse_integer_sizes() {
    let mut writer = DmapWriter::new();
    writer.u8(b"msau", 2);
    writer.u16(b"astn", 12);
    writer.u32(b"mstt", 200);
    writer.u64(b"mper", 0xDEAD_BEEF_CAFE_F00D);
    writer.version(b"apro", 3, 0, 2);
    let buf = writer.finish();

    let items = parse(&buf, &registry()).unwrap();
    assert_eq!(items[0].as_u8(), Some(2));
    assert_eq!(items[1].as_u16(), Some(12));
    assert_eq!(items[2].as_u32(), Some(200));
    assert_eq!(items[3].as_u64(), Some(0xDEAD_BEEF_CAFE_F00D));
    assert_eq!(items[4].as_version(), Some((3, 0, 2)));
}

#[test]
fn test_zero_length_payload_is_valid() {
    // Presence-only chunk under an unknown code decodes as empty raw bytes
    let mut writer = DmapWriter::new();
    writer.raw(b"zzzz", &[]);
    writer.string(b"minm", "");
    let buf = writer.finish();

    let items = parse(&buf, &registry()).unwrap();
    assert_eq!(items[0].value, DmapValue::Raw(Vec::new()));
    assert_eq!(items[1].as_str(), Some(""));
}

#[test]
fn test_unknown_code_falls_back_to_raw() {
    let mut writer = DmapWriter::new();
    writer.raw(b"xyzw", &[1, 2, 3]);
    let buf = writer.finish();

    let items = parse(&buf, &registry()).unwrap();
    assert_eq!(items[0].value, DmapValue::Raw(vec![1, 2, 3]));

    // Registering the code changes how it decodes
    let mut reg = registry();
    reg.register(ContentCode::new(b"xyzw"), ContentType::Raw);
    let items = parse(&buf, &reg).unwrap();
    assert_eq!(items[0].value, DmapValue::Raw(vec![1, 2, 3]));
}

#[test]
fn test_truncated_header_fails() {
    let buf = b"mst"; // not even a full code
    let err = parse(buf, &registry()).unwrap_err();
    assert!(matches!(err, DmapError::Truncated { .. }));
}

#[test]
fn test_length_overrun_fails_cleanly() {
    // Declares 100 payload bytes but provides 2
    let mut buf = Vec::new();
    buf.extend_from_slice(b"minm");
    buf.extend_from_slice(&100u32.to_be_bytes());
    buf.extend_from_slice(b"ab");

    let err = parse(&buf, &registry()).unwrap_err();
    match err {
        DmapError::LengthOverrun {
            code,
            declared,
            available,
        } => {
            assert_eq!(code, "minm");
            assert_eq!(declared, 100);
            assert_eq!(available, 2);
        }
        other => panic!("expected LengthOverrun, got {other:?}"),
    }
}

#[test]
fn test_overrun_inside_container_fails() {
    // Outer container is consistent; the inner chunk overruns it
    let mut buf = Vec::new();
    buf.extend_from_slice(b"mlcl");
    buf.extend_from_slice(&10u32.to_be_bytes());
    buf.extend_from_slice(b"minm");
    buf.extend_from_slice(&99u32.to_be_bytes());
    buf.extend_from_slice(b"ab");

    assert!(parse(&buf, &registry()).is_err());
}

#[test]
fn test_wrong_fixed_size_fails() {
    // mstt is u32 but carries 2 bytes
    let mut buf = Vec::new();
    buf.extend_from_slice(b"mstt");
    buf.extend_from_slice(&2u32.to_be_bytes());
    buf.extend_from_slice(&[0, 200]);

    let err = parse(&buf, &registry()).unwrap_err();
    assert!(matches!(err, DmapError::InvalidPayloadSize { .. }));
}

#[test]
fn test_deep_nesting_rejected() {
    // 64 nested containers, each wrapping the next
    let mut buf = Vec::new();
    for _ in 0..64 {
        let mut outer = Vec::new();
        outer.extend_from_slice(b"mlcl");
        #[allow(clippy::cast_possible_truncation)]
        outer.extend_from_slice(&(buf.len() as u32).to_be_bytes());
        outer.extend_from_slice(&buf);
        buf = outer;
    }

    let err = parse(&buf, &registry()).unwrap_err();
    assert!(matches!(err, DmapError::NestingTooDeep { .. }));
}

#[test]
fn test_roundtrip_is_byte_identical() {
    let mut writer = DmapWriter::new();
    writer.container(b"adbs", |db| {
        db.u32(b"mstt", 200);
        db.u8(b"muty", 0);
        db.u32(b"mtco", 1);
        db.u32(b"mrco", 1);
        db.container(b"mlcl", |listing| {
            listing.container(b"mlit", |item| {
                item.u32(b"miid", 42);
                item.u64(b"mper", 99);
                item.string(b"minm", "Round Trip");
                item.u16(b"asbr", 192);
                item.version(b"apro", 3, 0, 0);
                item.raw(b"zzzz", &[0xAA, 0xBB]);
            });
        });
    });
    let original = writer.finish();

    let reg = registry();
    let parsed = parse(&original, &reg).unwrap();
    let reencoded = serialize(&parsed);
    assert_eq!(reencoded, original);

    // Parsing is idempotent on the same bytes
    let reparsed = parse(&original, &reg).unwrap();
    assert_eq!(reparsed, parsed);
}
