//! `POST /api/webhook/whatsapp`: Twilio WhatsApp webhook, TwiML reply.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Form;

use crate::api::types::ApiContext;
use crate::channel::{handle_inbound, twiml_message, whatsapp::FAILURE_REPLY, InboundMessage};
use crate::db::repository::SqliteQueryStore;

pub async fn whatsapp(
    State(ctx): State<ApiContext>,
    Form(message): Form<InboundMessage>,
) -> impl IntoResponse {
    let reply = match ctx.core.open_db() {
        Ok(conn) => handle_inbound(
            &SqliteQueryStore::new(&conn),
            ctx.core.advice_context(),
            &ctx.core.config.frontend_url,
            &message,
        ),
        Err(e) => {
            tracing::error!(error = %e, "WhatsApp webhook could not open database");
            FAILURE_REPLY.to_string()
        }
    };

    ([(header::CONTENT_TYPE, "application/xml")], twiml_message(&reply))
}
