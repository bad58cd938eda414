//! Proptest generators for property-based testing.

use proptest::prelude::*;

use weft_core::{AuthorId, Msg, MsgBuilder, MsgId, MAX_LINKS};

/// Generate a random AuthorId.
pub fn author_id() -> impl Strategy<Value = AuthorId> {
    any::<[u8; 32]>().prop_map(AuthorId::from_bytes)
}

/// Generate a random MsgId.
pub fn msg_id() -> impl Strategy<Value = MsgId> {
    any::<[u8; 32]>().prop_map(MsgId::from_bytes)
}

/// Generate an application type tag.
pub fn kind() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}".prop_map(String::from)
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a structurally valid (depth, prev) pair: either a root or a
/// linked message with 1..=MAX_LINKS distinct predecessors.
pub fn links() -> impl Strategy<Value = (u64, Vec<MsgId>)> {
    prop_oneof![
        Just((0u64, Vec::new())),
        (1u64..=1000u64, prop::collection::hash_set(msg_id(), 1..=MAX_LINKS))
            .prop_map(|(depth, prev)| (depth, prev.into_iter().collect())),
    ]
}

/// Parameters for generating a message.
#[derive(Debug, Clone)]
pub struct MsgParams {
    pub author: AuthorId,
    pub kind: String,
    pub depth: u64,
    pub prev: Vec<MsgId>,
    pub payload: Vec<u8>,
}

impl Arbitrary for MsgParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (author_id(), kind(), links(), payload(1000))
            .prop_map(|(author, kind, (depth, prev), payload)| MsgParams {
                author,
                kind,
                depth,
                prev,
                payload,
            })
            .boxed()
    }
}

/// Generate a message from parameters.
pub fn msg_from_params(params: &MsgParams) -> Msg {
    let mut builder = MsgBuilder::new(params.author, params.kind.clone()).depth(params.depth);
    for link in &params.prev {
        builder = builder.link(*link);
    }
    builder.payload(params.payload.clone()).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{canonical_bytes, decode_msg, validate_msg};

    proptest! {
        #[test]
        fn test_msg_id_deterministic(params: MsgParams) {
            let m1 = msg_from_params(&params);
            let m2 = msg_from_params(&params);

            prop_assert_eq!(m1.compute_id(), m2.compute_id());
        }

        #[test]
        fn test_generated_msgs_validate(params: MsgParams) {
            let msg = msg_from_params(&params);
            prop_assert!(validate_msg(&msg).is_ok());
        }

        #[test]
        fn test_canonical_roundtrip(params: MsgParams) {
            let msg = msg_from_params(&params);
            let bytes = canonical_bytes(&msg);
            let decoded = decode_msg(&bytes).unwrap();

            prop_assert_eq!(&msg, &decoded);
            prop_assert_eq!(msg.compute_id(), decoded.compute_id());
        }

        #[test]
        fn test_msg_id_unique_with_different_payload(
            author in author_id(),
            p1 in payload(100),
            p2 in payload(100),
        ) {
            prop_assume!(p1 != p2);

            let m1 = MsgBuilder::new(author, "post").payload(p1).build();
            let m2 = MsgBuilder::new(author, "post").payload(p2).build();

            prop_assert_ne!(m1.compute_id(), m2.compute_id());
        }
    }
}
