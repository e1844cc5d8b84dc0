use futures::SinkExt;
use futures_util::stream::TryStreamExt;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_serde::formats::Json;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

#[derive(Debug, Error)]
pub enum JsonFramedError {
    #[error("Failed to receive a frame: {0}")]
    Receive(#[source] std::io::Error),

    #[error("Failed to send a frame: {0}")]
    Send(#[source] std::io::Error),

    #[error("Stream is closed")]
    StreamClosed,
}

type JsonFrame<Transport, RecvItem, SendItem> = tokio_serde::Framed<
    Framed<Transport, LengthDelimitedCodec>,
    RecvItem,
    SendItem,
    Json<RecvItem, SendItem>,
>;

/// Length-delimited JSON messages over a byte stream.
pub struct JsonFramed<
    Transport: AsyncRead + AsyncWrite + Unpin,
    RecvItem: DeserializeOwned + Unpin,
    SendItem: Serialize + Unpin,
> {
    frame: JsonFrame<Transport, RecvItem, SendItem>,
}

impl<
        Transport: AsyncRead + AsyncWrite + Unpin,
        RecvItem: DeserializeOwned + Unpin,
        SendItem: Serialize + Unpin,
    > JsonFramed<Transport, RecvItem, SendItem>
{
    pub const MAX_FRAME_LENGTH: usize = 1024 * 1024;

    pub fn new(stream: Transport) -> Self {
        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(Self::MAX_FRAME_LENGTH)
            .new_codec();
        Self {
            frame: tokio_serde::Framed::new(Framed::new(stream, codec), Json::default()),
        }
    }

    /// Returns `None` once the peer has closed the stream.
    pub async fn try_recv(&mut self) -> Result<Option<RecvItem>, JsonFramedError> {
        self.frame.try_next().await.map_err(JsonFramedError::Receive)
    }

    pub async fn recv(&mut self) -> Result<RecvItem, JsonFramedError> {
        self.try_recv().await?.ok_or(JsonFramedError::StreamClosed)
    }

    pub async fn send(&mut self, item: SendItem) -> Result<(), JsonFramedError> {
        self.frame.send(item).await.map_err(JsonFramedError::Send)
    }
}

#[cfg(test)]
mod test {
    use tokio::net::UnixStream;

    use super::{JsonFramed, JsonFramedError};

    #[tokio::test]
    async fn request_and_reply() {
        let (sock1, sock2) = UnixStream::pair().unwrap();
        let mut client = JsonFramed::<UnixStream, String, u32>::new(sock1);
        let mut server = JsonFramed::<UnixStream, u32, String>::new(sock2);
        let task = tokio::spawn(async move {
            client.send(7).await?;
            client.recv().await
        });
        let request = server.recv().await.unwrap();
        server.send(format!("reply to {request}")).await.unwrap();
        assert_eq!(task.await.unwrap().unwrap(), "reply to 7");
    }

    #[tokio::test]
    async fn closed_stream() {
        let (sock1, sock2) = UnixStream::pair().unwrap();
        let mut server = JsonFramed::<UnixStream, u32, u32>::new(sock2);
        drop(sock1);
        assert!(server.try_recv().await.unwrap().is_none());
        assert!(matches!(
            server.recv().await,
            Err(JsonFramedError::StreamClosed)
        ));
    }
}
