//! Messaging-channel adaptation: inbound text plus sender in, reply text out.

pub mod whatsapp;

pub use whatsapp::{
    handle_inbound, infer_cluster, parse_inbound, twiml_message, InboundIntent, InboundMessage,
};
