use super::value_objects::OrderId;

// ============================================================================
// Order Identifier Assignment
// ============================================================================
//
// Order-created events may carry an orderId. When they do not, the id is
// derived from where the message sits in the queue, so every retry and every
// redelivery of one message resolves to the same order:
//
//   bit  63       always 0
//   bits 41..=62  partition (22 bits)
//   bits  0..=40  offset    (41 bits)
//
// Ids are unique within one order-created topic.
//
// ============================================================================

const OFFSET_BITS: u32 = 41;
const PARTITION_BITS: u32 = 22;

pub const MAX_DELIVERY_PARTITION: i32 = (1 << PARTITION_BITS) - 1;
pub const MAX_DELIVERY_OFFSET: i64 = (1 << OFFSET_BITS) - 1;

/// Order id for the message at `partition`/`offset`, or None when either is
/// outside the encodable range
pub fn order_id_for_delivery(partition: i32, offset: i64) -> Option<OrderId> {
    if !(0..=MAX_DELIVERY_PARTITION).contains(&partition)
        || !(0..=MAX_DELIVERY_OFFSET).contains(&offset)
    {
        return None;
    }

    Some((i64::from(partition) << OFFSET_BITS) | offset)
}
