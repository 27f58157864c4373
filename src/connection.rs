// ABOUTME: Line-oriented AT command channel over any async byte stream
// ABOUTME: Frames replies into responses, handles the PDU prompt and queues unsolicited codes

use crate::at::tokens::line_tag;
use crate::at::{AtRequest, AtResponse, FinalResponse, ResponseArity, UrcGroup};
use bytes::{Buf, BytesMut};
use std::collections::VecDeque;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, trace};

/// Unsolicited codes followed by a hex PDU line
const PDU_NOTIFICATIONS: [&str; 3] = ["+CMT", "+CDS", "+CBM"];

/// Information lines followed by a hex PDU line
const PDU_REPLIES: [&str; 2] = ["+CMGR", "+CMGL"];

/// How long to wait for the `> ` prompt of a two-part command by default
pub const DEFAULT_PROMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a new exchange waits for the late reply of an abandoned one
pub const DEFAULT_RESYNC_TIMEOUT: Duration = Duration::from_secs(1);

/// Escape, cancelling PDU input after the prompt
const ESC: &[u8] = b"\x1B";

/// An exchange whose final result line has not been read yet
#[derive(Copy, Clone, Debug)]
struct Outstanding {
    prefix: Option<&'static str>,
}

/// One unit read from the modem
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Text(String),
    /// `> `, the modem is ready for PDU data
    Prompt,
}

/// AT command channel to one modem.
///
/// Exchanges are strictly sequential: [`transact`](Self::transact) writes a
/// command and reads until its final result line. Unsolicited codes arriving
/// meanwhile are queued and handed out by
/// [`next_unsolicited`](Self::next_unsolicited).
#[derive(Debug)]
pub struct AtConnection<S> {
    // The stream, decorated with a `BufWriter` so a command is written with
    // a single flush.
    stream: BufWriter<S>,

    // Bytes read but not yet framed into lines.
    buffer: BytesMut,

    unsolicited: VecDeque<UrcGroup>,

    // Set while an exchange runs. Still set when the next one starts means
    // the previous caller gave up, and its reply may yet arrive.
    in_flight: Option<Outstanding>,

    prompt_timeout: Duration,

    resync_timeout: Duration,
}

impl AtConnection<TcpStream> {
    /// Connect to a modem exposed over TCP, e.g. by a serial bridge
    pub async fn connect<A: tokio::net::ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let socket = TcpStream::connect(addr).await?;
        socket.set_nodelay(true)?;
        Ok(Self::new(socket))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> AtConnection<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufWriter::new(stream),
            // Replies are a few hundred bytes at most; a listing of a full
            // SIM fits comfortably.
            buffer: BytesMut::with_capacity(4 * 1024),
            unsolicited: VecDeque::new(),
            in_flight: None,
            prompt_timeout: DEFAULT_PROMPT_TIMEOUT,
            resync_timeout: DEFAULT_RESYNC_TIMEOUT,
        }
    }

    pub fn with_prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    pub fn with_resync_timeout(mut self, timeout: Duration) -> Self {
        self.resync_timeout = timeout;
        self
    }

    /// Send `request` and collect everything up to its final result line.
    ///
    /// A two-part command is written in two steps: the command line, then
    /// the PDU once the modem prompts for it. A missing prompt cancels the
    /// command with ESC and yields a timed out response.
    ///
    /// If a previous call was dropped before its final result line, that
    /// reply is read and discarded first, waiting at most the resync timeout.
    pub async fn transact(&mut self, request: &AtRequest) -> io::Result<AtResponse> {
        if let Some(stale) = self.in_flight {
            self.resync(stale).await?;
            self.in_flight = None;
        }

        self.in_flight = Some(Outstanding {
            prefix: request.prefix,
        });
        let result = self.exchange(request).await;
        // A cancelled PDU command may still produce a final result line
        let cancelled = matches!(&result, Ok(r) if r.final_response == FinalResponse::Timeout);
        if !cancelled {
            self.in_flight = None;
        }
        result
    }

    async fn exchange(&mut self, request: &AtRequest) -> io::Result<AtResponse> {
        match request.split_pdu() {
            Some((head, body)) => {
                self.write_line(head).await?;
                let prompt = tokio::time::timeout(self.prompt_timeout, self.wait_prompt()).await;
                match prompt {
                    Ok(Ok(None)) => {}
                    Ok(Ok(Some(rejected))) => return Ok(rejected),
                    Ok(Err(e)) => return Err(e),
                    Err(_) => {
                        debug!("No prompt for {:?}, cancelling", head);
                        self.stream.write_all(ESC).await?;
                        self.stream.flush().await?;
                        return Ok(AtResponse::timeout());
                    }
                }
                trace!("> {:?}", body);
                self.stream.write_all(body.as_bytes()).await?;
                self.stream.flush().await?;
            }
            None => {
                trace!("> {:?}", request.command);
                self.stream.write_all(request.command.as_bytes()).await?;
                self.stream.flush().await?;
            }
        }

        self.collect(request).await
    }

    /// Next unsolicited code, from the queue or read from the stream.
    ///
    /// Returns `None` when the modem closes the stream cleanly.
    pub async fn next_unsolicited(&mut self) -> io::Result<Option<UrcGroup>> {
        if let Some(group) = self.unsolicited.pop_front() {
            return Ok(Some(group));
        }

        loop {
            let Some(line) = self.read_line().await? else {
                return Ok(None);
            };
            let Line::Text(text) = line else {
                continue;
            };
            match line_tag(&text) {
                Some(tag) => {
                    let tag = tag.to_string();
                    return self.read_group(tag, text).await.map(Some);
                }
                None => trace!("Ignoring stray line {:?}", text),
            }
        }
    }

    async fn write_line(&mut self, line: &str) -> io::Result<()> {
        trace!("> {:?}", line);
        self.stream.write_all(line.as_bytes()).await?;
        self.stream.write_all(b"\r").await?;
        self.stream.flush().await
    }

    /// Waits for the PDU prompt. A final line instead means the command was
    /// refused, and is returned as the response.
    async fn wait_prompt(&mut self) -> io::Result<Option<AtResponse>> {
        loop {
            match self.read_line().await? {
                None => return Err(io::ErrorKind::UnexpectedEof.into()),
                Some(Line::Prompt) => return Ok(None),
                Some(Line::Text(text)) => {
                    if let Some(final_response) = FinalResponse::parse(&text) {
                        return Ok(Some(AtResponse {
                            success: false,
                            lines: Vec::new(),
                            final_response,
                        }));
                    }
                    self.route_stray(text).await?;
                }
            }
        }
    }

    async fn collect(&mut self, request: &AtRequest) -> io::Result<AtResponse> {
        let mut lines = Vec::new();
        let mut pdu_follows = false;

        loop {
            let Some(line) = self.read_line().await? else {
                return Err(io::ErrorKind::UnexpectedEof.into());
            };
            let Line::Text(text) = line else {
                continue;
            };

            if pdu_follows {
                pdu_follows = false;
                lines.push(text);
                continue;
            }

            if let Some(final_response) = FinalResponse::parse(&text) {
                debug!("{:?} after {} lines", final_response, lines.len());
                return Ok(AtResponse {
                    success: final_response.is_success(),
                    lines,
                    final_response,
                });
            }

            match line_tag(&text) {
                Some(tag) if Some(tag) == request.prefix => {
                    if request.arity == ResponseArity::SingleLine && !lines.is_empty() {
                        trace!("Extra reply line {:?}", text);
                    }
                    pdu_follows = PDU_REPLIES.contains(&tag);
                    lines.push(text);
                }
                Some(_) => self.route_stray(text).await?,
                None if text.starts_with("AT") => trace!("Echo {:?}", text),
                None if request.arity != ResponseArity::None => lines.push(text),
                None => trace!("Ignoring {:?}", text),
            }
        }
    }

    async fn resync(&mut self, stale: Outstanding) -> io::Result<()> {
        match tokio::time::timeout(self.resync_timeout, self.discard_reply(stale)).await {
            Ok(result) => result,
            Err(_) => {
                debug!("No late reply within {:?}", self.resync_timeout);
                Ok(())
            }
        }
    }

    /// Reads up to the final result line of an abandoned exchange, keeping
    /// unsolicited codes that arrive in between
    async fn discard_reply(&mut self, stale: Outstanding) -> io::Result<()> {
        let mut pdu_follows = false;

        loop {
            let Some(line) = self.read_line().await? else {
                return Err(io::ErrorKind::UnexpectedEof.into());
            };
            let Line::Text(text) = line else {
                continue;
            };

            if pdu_follows {
                pdu_follows = false;
                trace!("Discarding {:?}", text);
                continue;
            }

            if let Some(final_response) = FinalResponse::parse(&text) {
                debug!("Discarded late {:?}", final_response);
                return Ok(());
            }

            match line_tag(&text) {
                Some(tag) if Some(tag) == stale.prefix => {
                    pdu_follows = PDU_REPLIES.contains(&tag);
                    trace!("Discarding {:?}", text);
                }
                Some(_) => self.route_stray(text).await?,
                None => trace!("Discarding {:?}", text),
            }
        }
    }

    /// Queues a tagged line that does not belong to the current exchange
    async fn route_stray(&mut self, text: String) -> io::Result<()> {
        let Some(tag) = line_tag(&text).map(str::to_string) else {
            trace!("Ignoring {:?}", text);
            return Ok(());
        };
        let group = self.read_group(tag, text).await?;
        self.unsolicited.push_back(group);
        Ok(())
    }

    async fn read_group(&mut self, tag: String, first: String) -> io::Result<UrcGroup> {
        let mut lines = vec![first];
        if PDU_NOTIFICATIONS.contains(&tag.as_str()) {
            loop {
                match self.read_line().await? {
                    Some(Line::Text(pdu)) => {
                        lines.push(pdu);
                        break;
                    }
                    Some(Line::Prompt) => continue,
                    None => break,
                }
            }
        }
        debug!("Unsolicited {} with {} lines", tag, lines.len());
        Ok(UrcGroup { name: tag, lines })
    }

    /// Read one line, waiting for more data as needed. `None` on a clean
    /// close.
    async fn read_line(&mut self) -> io::Result<Option<Line>> {
        loop {
            if let Some(line) = self.parse_line() {
                return Ok(Some(line));
            }

            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                // Leftover bytes mean the modem went away mid-line
                return if self.buffer.iter().all(|b| b.is_ascii_whitespace()) {
                    Ok(None)
                } else {
                    Err(io::ErrorKind::ConnectionReset.into())
                };
            }
        }
    }

    /// Frames one line out of the buffer, if a complete one is present
    fn parse_line(&mut self) -> Option<Line> {
        while matches!(self.buffer.first(), Some(b'\r' | b'\n')) {
            self.buffer.advance(1);
        }

        if self.buffer.starts_with(b"> ") {
            self.buffer.advance(2);
            trace!("< prompt");
            return Some(Line::Prompt);
        }

        let end = self.buffer.iter().position(|b| *b == b'\r' || *b == b'\n')?;
        let raw = self.buffer.split_to(end);
        let text = String::from_utf8_lossy(&raw).into_owned();
        trace!("< {:?}", text);
        Some(Line::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    fn request(command: &str, prefix: Option<&'static str>, arity: ResponseArity) -> AtRequest {
        AtRequest {
            command: command.to_string(),
            prefix,
            arity,
        }
    }

    #[tokio::test]
    async fn test_single_line_exchange() {
        let (client, mut modem) = duplex(1024);
        let mut connection = AtConnection::new(client);

        modem
            .write_all(b"\r\n+CPMS: 1,30,1,30,1,30\r\n\r\nOK\r\n")
            .await
            .unwrap();
        let response = connection
            .transact(&request("AT+CPMS=\"SM\",\"SM\",\"SM\"\r", Some("+CPMS"), ResponseArity::SingleLine))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.lines, vec!["+CPMS: 1,30,1,30,1,30"]);

        let mut written = vec![0u8; 23];
        modem.read_exact(&mut written).await.unwrap();
        assert_eq!(&written, b"AT+CPMS=\"SM\",\"SM\",\"SM\"\r");
    }

    #[tokio::test]
    async fn test_read_collects_pdu_line() {
        let (client, mut modem) = duplex(1024);
        let mut connection = AtConnection::new(client);

        modem
            .write_all(b"\r\n+CMGR: 0,,5\r\n0001000A0B0C\r\n\r\nOK\r\n")
            .await
            .unwrap();
        let response = connection
            .transact(&request("AT+CMGR=1\r", Some("+CMGR"), ResponseArity::SingleLine))
            .await
            .unwrap();

        assert_eq!(response.lines, vec!["+CMGR: 0,,5", "0001000A0B0C"]);
    }

    #[tokio::test]
    async fn test_error_final() {
        let (client, mut modem) = duplex(1024);
        let mut connection = AtConnection::new(client);

        modem.write_all(b"\r\n+CMS ERROR: 321\r\n").await.unwrap();
        let response = connection
            .transact(&request("AT+CMGD=9,0\r", None, ResponseArity::None))
            .await
            .unwrap();

        assert!(!response.success);
        assert_eq!(response.final_response, FinalResponse::CmsError(321));
    }

    #[tokio::test]
    async fn test_unsolicited_during_exchange_is_queued() {
        let (client, mut modem) = duplex(1024);
        let mut connection = AtConnection::new(client);

        modem
            .write_all(b"\r\n+CMT: ,4\r\n0004000A0B\r\n\r\n+CMTI: \"SM\",2\r\n\r\nOK\r\n")
            .await
            .unwrap();
        let response = connection
            .transact(&request("AT+CMGD=1,0\r", None, ResponseArity::None))
            .await
            .unwrap();
        assert!(response.success);
        assert!(response.lines.is_empty());

        let cmt = connection.next_unsolicited().await.unwrap().unwrap();
        assert_eq!(cmt, UrcGroup::new("+CMT", ["+CMT: ,4", "0004000A0B"]));
        let cmti = connection.next_unsolicited().await.unwrap().unwrap();
        assert_eq!(cmti, UrcGroup::new("+CMTI", ["+CMTI: \"SM\",2"]));
    }

    #[tokio::test]
    async fn test_two_part_command_waits_for_prompt() {
        let (client, mut modem) = duplex(1024);
        let mut connection = AtConnection::new(client);

        let modem_task = tokio::spawn(async move {
            let mut head = vec![0u8; 10];
            modem.read_exact(&mut head).await.unwrap();
            assert_eq!(&head, b"AT+CMGS=3\r");
            modem.write_all(b"\r\n> ").await.unwrap();

            let mut body = vec![0u8; 10];
            modem.read_exact(&mut body).await.unwrap();
            assert_eq!(&body, b"0011000A\x1A\r");
            modem.write_all(b"\r\n+CMGS: 7\r\n\r\nOK\r\n").await.unwrap();
        });

        let response = connection
            .transact(&request(
                "AT+CMGS=3\r0011000A\x1A\r",
                Some("+CMGS"),
                ResponseArity::SingleLine,
            ))
            .await
            .unwrap();
        modem_task.await.unwrap();

        assert_eq!(response.lines, vec!["+CMGS: 7"]);
    }

    #[tokio::test]
    async fn test_missing_prompt_cancels_with_escape() {
        let (client, mut modem) = duplex(1024);
        let mut connection =
            AtConnection::new(client).with_prompt_timeout(Duration::from_millis(20));

        let response = connection
            .transact(&request(
                "AT+CMGW=3,2\r0011000A\x1A\r",
                Some("+CMGW"),
                ResponseArity::SingleLine,
            ))
            .await
            .unwrap();
        assert_eq!(response.final_response, FinalResponse::Timeout);

        let mut written = vec![0u8; 13];
        modem.read_exact(&mut written).await.unwrap();
        assert_eq!(&written, b"AT+CMGW=3,2\r\x1B");
    }

    #[tokio::test]
    async fn test_late_reply_is_not_taken_for_the_next() {
        let (client, mut modem) = duplex(1024);
        let mut connection = AtConnection::new(client);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            connection.transact(&request("AT+CMGD=1,0\r", None, ResponseArity::None)),
        )
        .await;
        assert!(abandoned.is_err());

        modem
            .write_all(b"\r\nOK\r\n\r\n+CMTI: \"SM\",3\r\n\r\n+CPMS: 1,30,1,30,1,30\r\n\r\nOK\r\n")
            .await
            .unwrap();
        let response = connection
            .transact(&request("AT+CPMS=\"SM\",\"SM\",\"SM\"\r", Some("+CPMS"), ResponseArity::SingleLine))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.lines, vec!["+CPMS: 1,30,1,30,1,30"]);
        assert_eq!(
            connection.next_unsolicited().await.unwrap(),
            Some(UrcGroup::new("+CMTI", ["+CMTI: \"SM\",3"]))
        );
    }

    #[tokio::test]
    async fn test_lost_reply_gives_up_after_resync_timeout() {
        let (client, mut modem) = duplex(1024);
        let mut connection =
            AtConnection::new(client).with_resync_timeout(Duration::from_millis(20));

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            connection.transact(&request("AT+CMGD=1,0\r", None, ResponseArity::None)),
        )
        .await;
        assert!(abandoned.is_err());

        let modem_task = tokio::spawn(async move {
            let mut written = vec![0u8; 12 + 9];
            modem.read_exact(&mut written).await.unwrap();
            assert_eq!(&written, b"AT+CMGD=1,0\rAT+CSCA?\r");
            modem
                .write_all(b"\r\n+CSCA: \"447700900123\",145\r\n\r\nOK\r\n")
                .await
                .unwrap();
        });

        let response = connection
            .transact(&request("AT+CSCA?\r", Some("+CSCA"), ResponseArity::SingleLine))
            .await
            .unwrap();
        modem_task.await.unwrap();

        assert!(response.success);
        assert_eq!(response.lines, vec!["+CSCA: \"447700900123\",145"]);
    }

    #[tokio::test]
    async fn test_clean_close() {
        let (client, modem) = duplex(64);
        let mut connection = AtConnection::new(client);
        drop(modem);
        assert_eq!(connection.next_unsolicited().await.unwrap(), None);
    }
}
