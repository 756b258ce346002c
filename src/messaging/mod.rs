mod redpanda;

pub use redpanda::RedpandaConsumer;
