//! Socket-free calls through the in-memory transport.

use futures::FutureExt;
use serde::{Deserialize, Serialize};

use wirecall::{local_exec, local_get, local_put, Auth, Context, RpcError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Message {
    message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SaveResult {
    message: String,
    size: u64,
}

fn auth() -> Auth {
    Auth::create(b"qwert", b"12345")
}

fn test_payload(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

async fn hello_handler(ctx: &mut Context) -> wirecall::Result<()> {
    let params: Message = ctx.bind_params()?;
    ctx.drain_bin().await?;
    let result = Message {
        message: format!("hello, {}!", params.message),
    };
    ctx.send_result(&result, 0).await
}

#[tokio::test]
async fn local_exec_round_trip() {
    let params = Message {
        message: "server".into(),
    };
    let result: Message = local_exec("hello", &params, &auth(), |ctx| {
        hello_handler(ctx).boxed()
    })
    .await
    .expect("local exec");

    assert_eq!(result.message, "hello, server!");
}

#[tokio::test]
async fn local_put_round_trip() {
    let payload = test_payload(16);
    let mut reader = &payload[..];
    let params = Message {
        message: "save data!".into(),
    };

    let result: SaveResult = local_put(
        "save",
        &mut reader,
        16,
        &params,
        &auth(),
        |ctx| {
            async move {
                let _params: Message = ctx.bind_params()?;
                let mut received = Vec::new();
                ctx.read_bin(&mut received).await?;
                let result = SaveResult {
                    message: "saved successfully!".into(),
                    size: received.len() as u64,
                };
                ctx.send_result(&result, 0).await
            }
            .boxed()
        },
    )
    .await
    .expect("local put");

    assert_eq!(result.size, 16);
}

#[tokio::test]
async fn local_put_larger_than_pipe_capacity() {
    // Forces the upload and the service loop to interleave.
    let payload = test_payload(wirecall::transport::local::PIPE_CAPACITY * 3);
    let size = payload.len() as u64;
    let mut reader = &payload[..];
    let params = Message {
        message: "bulk".into(),
    };

    let result: SaveResult = local_put("save", &mut reader, size, &params, &auth(), |ctx| {
        async move {
            let mut received = Vec::new();
            ctx.read_bin(&mut received).await?;
            let result = SaveResult {
                message: "saved successfully!".into(),
                size: received.len() as u64,
            };
            ctx.send_result(&result, 0).await
        }
        .boxed()
    })
    .await
    .expect("local put");

    assert_eq!(result.size, size);
}

#[tokio::test]
async fn local_get_round_trip() {
    let mut sink = Vec::new();
    let params = Message {
        message: "load data!".into(),
    };

    let result: Message = local_get("load", &mut sink, &params, &auth(), |ctx| {
        async move {
            let _params: Message = ctx.bind_params()?;
            ctx.drain_bin().await?;
            let payload = (0..1024).map(|i| (i % 251) as u8).collect::<Vec<u8>>();
            let result = Message {
                message: "load successful!".into(),
            };
            ctx.send_result(&result, payload.len() as u64).await?;
            ctx.write_bin(&mut &payload[..], payload.len() as u64).await?;
            Ok(())
        }
        .boxed()
    })
    .await
    .expect("local get");

    assert_eq!(result.message, "load successful!");
    assert_eq!(sink, test_payload(1024));
}

#[tokio::test]
async fn handler_error_reaches_the_local_caller() {
    let params = Message {
        message: "nope".into(),
    };
    let outcome: wirecall::Result<Message> = local_exec("hello", &params, &auth(), |ctx| {
        async move {
            let err = RpcError::Auth("auth ident or pass mismatch".into());
            ctx.send_error(&err).await?;
            Err(err)
        }
        .boxed()
    })
    .await;

    match outcome {
        Err(RpcError::Remote(msg)) => assert_eq!(msg, "auth ident or pass mismatch"),
        other => panic!("expected remote error, got {other:?}"),
    }
}
