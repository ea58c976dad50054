use blockswap_api::{Block, ContentId, PeerId};

fn short_hex(
    b: &bytes::Bytes,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    for byte in b.iter().take(4) {
        write!(f, "{byte:02x}")?;
    }
    f.write_str("..")
}

#[test]
fn global_display_callbacks() {
    assert!(ContentId::set_global_display_callback(short_hex));
    assert!(PeerId::set_global_display_callback(short_hex));

    // the display is fixed once set
    assert!(!ContentId::set_global_display_callback(short_hex));

    let cid = ContentId::hash_of(b"hello");
    assert_eq!("2cf24dba..", cid.to_string());
    assert_eq!("2cf24dba..", format!("{cid:?}"));

    let peer = PeerId::from(bytes::Bytes::from_static(&[1, 2, 3, 4, 5]));
    assert_eq!("01020304..", peer.to_string());

    let block = Block::with_cid(cid, vec![0_u8; 3]);
    assert_eq!(
        "Block { cid: 2cf24dba.., len: 3 }",
        format!("{block:?}").as_str()
    );
}
