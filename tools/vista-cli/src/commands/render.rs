//! `vista render`.

use std::cell::Cell;

use anyhow::{bail, Result};
use serde::Serialize;
use vista_sdk::vista_core::RequestHeaders;
use vista_sdk::vista_streaming::{
    IncomingRequest, MemoryConnection, ResponderOutcome, SsrResponder,
};

use super::RenderArgs;
use crate::context::Context;
use crate::output::format_bytes;

#[derive(Serialize)]
struct RenderReport<'a> {
    url: &'a str,
    passed_through: bool,
    status: Option<u16>,
    headers: &'a [(String, String)],
    body: String,
}

fn parse_header(raw: &str) -> Result<(String, String)> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => bail!("invalid header '{}', expected 'name: value'", raw),
    }
}

pub async fn run(args: RenderArgs, ctx: &Context) -> Result<()> {
    let headers = args
        .headers
        .iter()
        .map(|h| parse_header(h))
        .collect::<Result<Vec<_>>>()?;
    let request = IncomingRequest::new(&args.url).with_headers(RequestHeaders::from_pairs(headers));

    let responder = SsrResponder::new(ctx.renderer.clone()).with_config(&ctx.config.server);
    let mut conn = MemoryConnection::new();
    let passed = Cell::new(false);

    let outcome = responder
        .handle(request, &mut conn, || passed.set(true))
        .await?;

    if ctx.output.is_json() {
        ctx.output.json(&RenderReport {
            url: &args.url,
            passed_through: passed.get(),
            status: conn.status(),
            headers: conn.headers(),
            body: conn.body_text(),
        });
        return Ok(());
    }

    match outcome {
        ResponderOutcome::PassedThrough(reason) => {
            ctx.output
                .warn(&format!("{} was passed through to the host ({:?})", args.url, reason));
        }
        ResponderOutcome::ClientGone { .. } => {
            ctx.output.warn("connection closed before the response finished");
        }
        ResponderOutcome::Responded {
            status_code,
            bytes_written,
        } => {
            ctx.output.status_line(status_code, &args.url);
            for (name, value) in conn.headers() {
                ctx.output.header_field(name, value);
            }
            ctx.output.debug(&format!("{} written", format_bytes(bytes_written as u64)));
            if !args.head {
                ctx.output.body(&conn.body_text());
            }
        }
    }

    Ok(())
}
