//! End-to-end dissection tests.
//!
//! 1. Records round-trip through their packed form
//! 2. Every Record of a randomly truncated or corrupted frame lies within the captured length,
//!    and the protocol-seen bitmask agrees with the Record table
//! 3. Dissecting the same frame after a reset always produces the same descriptor

use byteorder::{BigEndian, LittleEndian};
use netdissect_core::config::parse_config;
use netdissect_core::descriptor::type2::TYPE2_LEN;
use netdissect_core::descriptor::{DescriptorType, DescriptorView};
use netdissect_core::dissector::record::{decode_record, encode_record, MAX_RECORDS};
use netdissect_core::protocols::id::{known_ids, CoreProtocol, Pack};
use netdissect_core::protocols::packet::tcp::Tcp;
use netdissect_core::stats;
use netdissect_core::{DatalinkType, Dissector, ProtocolId};

use proptest::collection::vec;
use proptest::prelude::*;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A representative set of frames covering every stage.
fn samples() -> Vec<Vec<u8>> {
    [
        // RARP
        "000c29340bde000c29c5f69b80350001080006040004000c29c5f69b0a01010a000c29340bde0a010164",
        // IPv4 + TCP SYN with options
        concat!(
            "0000000000020000000000010800",
            "4500003c00004000400600000a0000010a000002",
            "c35000500000000100000000a002721000000000",
            "020405b40402080a000000000000000001030307",
        ),
        // IPv6 + Hop-by-Hop + UDP
        concat!(
            "333300000016000c29c5f69b86dd",
            "6000000000100001fe800000000000000000000000000001ff020000000000000000000000000016",
            "1100050200000100",
            "d43100350008ffff",
        ),
        // IPv6 + MLDv2 report with two records
        concat!(
            "333300000016000c29c5f69b86dd",
            "6000000000403a01fe800000000000000000000000000001ff020000000000000000000000000016",
            "8f00000000000002",
            "04000000ff0200000000000000000000000000fb",
            "01000001ff020000000000000000000000000001fe800000000000000000000000000009",
        ),
        // IPv4 + GRE + IPv4 + ICMP echo
        concat!(
            "0000000000020000000000010800",
            "4500004600000000402f00000a0000010a000002",
            "200008000000002a",
            "4500001c00000000400100000a0000030a000004",
            "0800f7fe00000001",
        ),
    ]
    .iter()
    .map(|h| hex::decode(h).unwrap())
    .collect()
}

fn check_invariants(dissector: &Dissector, default_bitmask: u64) -> Result<(), TestCaseError> {
    let caplen = dissector.captured_length();
    let mut expected = default_bitmask;
    prop_assert!(dissector.records().len() <= MAX_RECORDS);
    for record in dissector.records().iter() {
        prop_assert!(record.end() <= caplen, "{:?} past {}", record, caplen);
        if record.id.is_core() {
            expected |= 1 << record.id.ordinal();
        }
    }
    prop_assert_eq!(dissector.bitmask(), expected);
    Ok(())
}

#[test]
fn dissect_sample_frames() {
    init();
    let frames = samples();
    let mut dissector = Dissector::new();

    dissector.dissect(&frames[1], 0, frames[1].len(), frames[1].len()).unwrap();
    let (_, record) = dissector.lookup(CoreProtocol::Tcp, 0).unwrap();
    assert_eq!((record.offset, record.length), (34, 40));
    let mut buf = [0u8; TYPE2_LEN];
    dissector.write_descriptor_with::<BigEndian>(&mut buf).unwrap();
    let view = DescriptorView::<BigEndian>::new(&buf, DescriptorType::Type2).unwrap();
    let tcp: Tcp = view.bind(&frames[1], 0).unwrap();
    assert!(tcp.syn());
    assert_eq!(tcp.options().len(), 20);
    dissector.reset();

    dissector.dissect(&frames[2], 0, frames[2].len(), frames[2].len()).unwrap();
    let (_, ipv6) = dissector.lookup(CoreProtocol::Ipv6, 0).unwrap();
    assert_eq!(ipv6.length, 48);
    dissector.reset();

    dissector.dissect(&frames[3], 0, frames[3].len(), frames[3].len()).unwrap();
    let (_, report) = dissector
        .lookup(CoreProtocol::Icmp6MulticastListenerReportV2, 0)
        .unwrap();
    assert_eq!(report.length, 64);
    let address_records = dissector
        .records()
        .iter()
        .filter(|r| r.id.pack() == Some(Pack::Icmp6Option))
        .count();
    assert_eq!(address_records, 2);
}

#[test]
fn dissect_from_config() {
    init();
    let config = parse_config(
        r#"
        datalink = "novell_raw"
        default_bitmask = 0
        byte_order = "little"
        "#,
    )
    .unwrap();
    let mut dissector = Dissector::from_config(&config);
    let frame = vec![0u8; 44];
    dissector.dissect(&frame, 0, frame.len(), frame.len()).unwrap();
    assert!(dissector.records().contains(CoreProtocol::Ipx));

    let mut buf = [0u8; TYPE2_LEN];
    dissector.write_descriptor(&mut buf).unwrap();
    let view = DescriptorView::<LittleEndian>::new(&buf, DescriptorType::Type2).unwrap();
    assert_eq!(view.captured_length(), 44);
    dissector.reset();

    dissector.set_datalink_type(DatalinkType::Ethernet);
    dissector.dissect(&frame, 0, frame.len(), frame.len()).unwrap();
    assert!(!dissector.records().contains(CoreProtocol::Ipx));
}

#[test]
fn dissect_updates_thread_stats() {
    init();
    stats::clear();
    let frames = samples();
    let mut dissector = Dissector::new();
    dissector.dissect(&frames[0], 0, frames[0].len(), frames[0].len()).unwrap();
    dissector.reset();
    dissector.dissect(&frames[0], 0, 8, frames[0].len()).unwrap();
    let snapshot = stats::snapshot();
    assert_eq!(snapshot.dissected_pkt, 2);
    assert_eq!(snapshot.dissected_byte, frames[0].len() as u64 + 8);
    assert_eq!(snapshot.unrecognized_pkt, 1);
    assert_eq!(snapshot.records_added, 2);
    assert!(snapshot.records_rejected >= 1);
}

proptest! {
    #[test]
    fn record_encoding_round_trips(id in any::<u32>(), offset in any::<u16>(), length in any::<u16>()) {
        let raw = encode_record(id, offset as usize, length as usize);
        prop_assert_eq!(decode_record(raw), (id, offset, length));
    }

    #[test]
    fn protocol_ids_round_trip(index in 0usize..64) {
        let ids: Vec<ProtocolId> = known_ids().collect();
        let id = ids[index % ids.len()];
        let pack = id.pack().unwrap();
        prop_assert_eq!(ProtocolId::new(pack, id.ordinal()), id);
    }

    #[test]
    fn truncated_frames_stay_in_bounds(sample in 0usize..5, cut in 0usize..128, bitmask in any::<u64>()) {
        init();
        let frames = samples();
        let frame = &frames[sample];
        let caplen = cut.min(frame.len());
        let mut dissector = Dissector::new();
        dissector.set_default_bitmask(bitmask);
        dissector.reset();
        let consumed = dissector.dissect(frame, 0, caplen, frame.len()).unwrap();
        prop_assert!(consumed == caplen || consumed == 0);
        check_invariants(&dissector, bitmask)?;
    }

    #[test]
    fn corrupted_frames_stay_in_bounds(
        sample in 0usize..5,
        flips in vec((0usize..128, any::<u8>()), 1..8),
    ) {
        let frames = samples();
        let mut frame = frames[sample].clone();
        for (at, value) in flips {
            let len = frame.len();
            frame[at % len] = value;
        }
        let mut dissector = Dissector::new();
        dissector.dissect(&frame, 0, frame.len(), frame.len()).unwrap();
        check_invariants(&dissector, 0)?;
    }

    #[test]
    fn random_bytes_never_panic(frame in vec(any::<u8>(), 0..256)) {
        let mut dissector = Dissector::new();
        dissector.dissect(&frame, 0, frame.len(), frame.len()).unwrap();
        check_invariants(&dissector, 0)?;
        let mut buf = [0u8; TYPE2_LEN];
        prop_assert_eq!(dissector.write_descriptor(&mut buf).unwrap(), TYPE2_LEN);
    }

    #[test]
    fn reset_is_idempotent(sample in 0usize..5, timestamp in any::<u64>()) {
        let frames = samples();
        let frame = &frames[sample];
        let mut dissector = Dissector::new();
        let mut first = [0u8; TYPE2_LEN];
        let mut second = [0u8; TYPE2_LEN];
        dissector.dissect(frame, timestamp, frame.len(), frame.len()).unwrap();
        dissector.write_descriptor(&mut first).unwrap();
        dissector.reset();
        dissector.dissect(frame, timestamp, frame.len(), frame.len()).unwrap();
        dissector.write_descriptor(&mut second).unwrap();
        prop_assert_eq!(&first[..], &second[..]);
    }
}
