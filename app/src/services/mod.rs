// order-relay/src/services/mod.rs

pub mod bus_publisher;
pub mod escalation;
pub mod http_client;
pub mod reservation;
pub mod sas_signer;

pub use bus_publisher::EventPublisher;
pub use escalation::EscalationNotifier;
pub use http_client::{OutboundHttp, OutboundReply, OutboundRequest, ReqwestHttp};
pub use reservation::OrderReservationConsumer;
