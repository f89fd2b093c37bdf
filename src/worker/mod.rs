pub mod order_processor;

pub use order_processor::{LoyaltyFacade, OrderProcessor, ProcessorConfig};
