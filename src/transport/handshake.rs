// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Shared secret handshake
//!
//! Mutual HMAC-SHA256 challenge/response performed once when a network
//! connection is established, before any sample flows. Each side proves it
//! knows the secret without sending it:
//!
//! 1. The listener sends a random nonce; the connector answers with
//!    `HMAC(secret, nonce)`; the listener replies `welcome` or `failure`.
//! 2. The roles are swapped and the connector challenges the listener.
//!
//! Any mismatch, unexpected message or early disconnect fails with
//! [`ChannelError::HandshakeRejected`].

use hmac::{Hmac, Mac};
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tokio::io::{AsyncBufRead, AsyncWrite};

use super::codec::{read_frame, write_frame};
use super::ChannelError;

type HmacSha256 = Hmac<Sha256>;

/// Size of the random challenge in bytes
pub const NONCE_LEN: usize = 32;

/// Messages exchanged during the handshake, one JSON line each
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandshakeMessage {
    Challenge { nonce: String },
    Response { digest: String },
    Welcome,
    Failure,
}

fn mac_for(secret: &[u8]) -> Result<HmacSha256, ChannelError> {
    HmacSha256::new_from_slice(secret)
        .map_err(|_| ChannelError::HandshakeRejected("unusable shared secret".to_string()))
}

/// Hex encoded `HMAC-SHA256(secret, nonce)`
pub fn compute_digest(secret: &[u8], nonce: &[u8]) -> Result<String, ChannelError> {
    let mut mac = mac_for(secret)?;
    mac.update(nonce);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

async fn expect_message<R>(reader: &mut R, line: &mut Vec<u8>) -> Result<HandshakeMessage, ChannelError>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    match read_frame(reader, line).await {
        Ok(Some(message)) => Ok(message),
        Ok(None) => Err(ChannelError::HandshakeRejected(
            "peer disconnected during handshake".to_string(),
        )),
        Err(ChannelError::Frame(err)) => Err(ChannelError::HandshakeRejected(format!(
            "malformed handshake message: {err}"
        ))),
        Err(err) => Err(err),
    }
}

/// Challenge the peer and check its answer
pub async fn deliver_challenge<R, W>(
    reader: &mut R,
    writer: &mut W,
    secret: &[u8],
) -> Result<(), ChannelError>
where
    R: AsyncBufRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill(&mut nonce);

    write_frame(
        writer,
        &HandshakeMessage::Challenge {
            nonce: hex::encode(nonce),
        },
    )
    .await?;

    let mut line = Vec::new();
    let accepted = match expect_message(reader, &mut line).await? {
        HandshakeMessage::Response { digest } => match hex::decode(&digest) {
            Ok(digest) => {
                let mut mac = mac_for(secret)?;
                mac.update(&nonce);
                mac.verify_slice(&digest).is_ok()
            }
            Err(_) => false,
        },
        other => {
            debug!("Expected a handshake response, got {:?}", other);
            false
        }
    };

    if accepted {
        write_frame(writer, &HandshakeMessage::Welcome).await?;
        Ok(())
    } else {
        warn!("Peer failed shared secret authentication");
        // Best effort: the peer may already be gone
        let _ = write_frame(writer, &HandshakeMessage::Failure).await;
        Err(ChannelError::HandshakeRejected(
            "peer failed authentication".to_string(),
        ))
    }
}

/// Answer a challenge from the peer
pub async fn answer_challenge<R, W>(
    reader: &mut R,
    writer: &mut W,
    secret: &[u8],
) -> Result<(), ChannelError>
where
    R: AsyncBufRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut line = Vec::new();
    let nonce = match expect_message(reader, &mut line).await? {
        HandshakeMessage::Challenge { nonce } => hex::decode(&nonce).map_err(|_| {
            ChannelError::HandshakeRejected("challenge nonce is not hex".to_string())
        })?,
        other => {
            return Err(ChannelError::HandshakeRejected(format!(
                "expected a challenge, got {other:?}"
            )))
        }
    };

    let digest = compute_digest(secret, &nonce)?;
    write_frame(writer, &HandshakeMessage::Response { digest }).await?;

    match expect_message(reader, &mut line).await? {
        HandshakeMessage::Welcome => Ok(()),
        HandshakeMessage::Failure => Err(ChannelError::HandshakeRejected(
            "shared secret rejected by peer".to_string(),
        )),
        other => Err(ChannelError::HandshakeRejected(format!(
            "expected welcome, got {other:?}"
        ))),
    }
}

/// Listener side: challenge first, then answer
pub async fn accept_side<R, W>(reader: &mut R, writer: &mut W, secret: &[u8]) -> Result<(), ChannelError>
where
    R: AsyncBufRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    deliver_challenge(reader, writer, secret).await?;
    answer_challenge(reader, writer, secret).await
}

/// Connector side: answer first, then challenge
pub async fn connect_side<R, W>(reader: &mut R, writer: &mut W, secret: &[u8]) -> Result<(), ChannelError>
where
    R: AsyncBufRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    answer_challenge(reader, writer, secret).await?;
    deliver_challenge(reader, writer, secret).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, split, BufReader};

    async fn run_pair(listener_secret: &'static [u8], connector_secret: &'static [u8]) -> (
        Result<(), ChannelError>,
        Result<(), ChannelError>,
    ) {
        let (a, b) = duplex(4096);
        let (a_read, mut a_write) = split(a);
        let (b_read, mut b_write) = split(b);

        let listener = tokio::spawn(async move {
            let mut reader = BufReader::new(a_read);
            accept_side(&mut reader, &mut a_write, listener_secret).await
        });
        let connector = tokio::spawn(async move {
            let mut reader = BufReader::new(b_read);
            connect_side(&mut reader, &mut b_write, connector_secret).await
        });

        (listener.await.unwrap(), connector.await.unwrap())
    }

    #[test]
    fn test_digest_is_keyed() {
        let nonce = [7u8; NONCE_LEN];
        let a = compute_digest(b"IronOS", &nonce).unwrap();
        let b = compute_digest(b"ironos", &nonce).unwrap();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_eq!(a, compute_digest(b"IronOS", &nonce).unwrap());
    }

    #[test]
    fn test_message_wire_shape() {
        let json = serde_json::to_string(&HandshakeMessage::Welcome).unwrap();
        assert_eq!(json, r#"{"type":"welcome"}"#);
        let json = serde_json::to_string(&HandshakeMessage::Challenge {
            nonce: "00ff".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"challenge","nonce":"00ff"}"#);
    }

    #[tokio::test]
    async fn test_matching_secrets_authenticate() {
        let (listener, connector) = run_pair(b"IronOS", b"IronOS").await;
        assert!(listener.is_ok(), "{listener:?}");
        assert!(connector.is_ok(), "{connector:?}");
    }

    #[tokio::test]
    async fn test_wrong_secret_is_rejected_on_both_sides() {
        let (listener, connector) = run_pair(b"IronOS", b"wrong").await;
        assert!(matches!(listener, Err(ChannelError::HandshakeRejected(_))));
        assert!(matches!(connector, Err(ChannelError::HandshakeRejected(_))));
    }

    #[tokio::test]
    async fn test_peer_speaking_out_of_turn_is_rejected() {
        let (a, b) = duplex(4096);
        let (a_read, mut a_write) = split(a);
        let (_b_read, mut b_write) = split(b);

        // Send a welcome before any challenge was issued
        write_frame(&mut b_write, &HandshakeMessage::Welcome).await.unwrap();

        let mut reader = BufReader::new(a_read);
        let result = answer_challenge(&mut reader, &mut a_write, b"IronOS").await;
        assert!(matches!(result, Err(ChannelError::HandshakeRejected(_))));
    }
}
