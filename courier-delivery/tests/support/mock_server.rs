//! Mock SMTP server for exercising the `lettre` transport end to end
#![allow(dead_code)] // Not every test uses every accessor
//!
//! Speaks just enough plaintext SMTP for a client to verify a connection
//! (EHLO + NOOP) and submit a message. Responses can be overridden to
//! inject failures, and every connection and command is recorded.

use std::{
    fmt::Write,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::RwLock,
    time::timeout,
};

/// SMTP command received by the mock server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpCommand {
    Ehlo(String),
    Helo(String),
    MailFrom(String),
    RcptTo(String),
    Data,
    /// Message content (after DATA)
    MessageContent(String),
    Noop,
    Rset,
    Quit,
    Other(String),
}

#[derive(Debug, Clone)]
struct Reply {
    code: u16,
    message: String,
}

impl Reply {
    fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        format!("{} {}\r\n", self.code, self.message).into_bytes()
    }
}

#[derive(Debug, Clone)]
struct Script {
    greeting: Reply,
    capabilities: Vec<String>,
    noop: Reply,
    rcpt_to: Reply,
    rejected_recipients: Vec<String>,
    data_end: Reply,
    response_delay: Option<Duration>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            greeting: Reply::new(220, "mock.courier.test ESMTP ready"),
            capabilities: vec!["mock.courier.test".to_string(), "SIZE 10485760".to_string()],
            noop: Reply::new(250, "OK"),
            rcpt_to: Reply::new(250, "OK"),
            rejected_recipients: Vec::new(),
            data_end: Reply::new(250, "OK: queued"),
            response_delay: None,
        }
    }
}

impl Script {
    fn ehlo(&self) -> Vec<u8> {
        let mut response = String::new();
        let last = self.capabilities.len().saturating_sub(1);

        for (i, capability) in self.capabilities.iter().enumerate() {
            let separator = if i < last { '-' } else { ' ' };
            let _ = write!(&mut response, "250{separator}{capability}\r\n");
        }

        response.into_bytes()
    }

    fn rcpt(&self, argument: &str) -> Vec<u8> {
        let argument = argument.to_lowercase();
        if self
            .rejected_recipients
            .iter()
            .any(|rejected| argument.contains(rejected))
        {
            Reply::new(550, "5.1.1 Mailbox unavailable").to_bytes()
        } else {
            self.rcpt_to.to_bytes()
        }
    }
}

/// Mock SMTP server for testing
pub struct MockSmtpServer {
    addr: SocketAddr,
    commands: Arc<RwLock<Vec<SmtpCommand>>>,
    connections: Arc<AtomicUsize>,
    shutdown: Arc<AtomicBool>,
}

impl MockSmtpServer {
    #[must_use]
    pub fn builder() -> MockSmtpServerBuilder {
        MockSmtpServerBuilder {
            script: Script::default(),
        }
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn commands(&self) -> Vec<SmtpCommand> {
        self.commands.read().await.clone()
    }

    /// Bodies of every message accepted by DATA
    pub async fn messages(&self) -> Vec<String> {
        self.commands
            .read()
            .await
            .iter()
            .filter_map(|command| match command {
                SmtpCommand::MessageContent(content) => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of TCP connections accepted so far
    #[must_use]
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    async fn handle_client(
        mut stream: TcpStream,
        script: Arc<Script>,
        commands: Arc<RwLock<Vec<SmtpCommand>>>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (reader, mut writer) = stream.split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        writer.write_all(&script.greeting.to_bytes()).await?;
        writer.flush().await?;

        // A refused greeting ends the conversation
        if script.greeting.code >= 400 {
            return Ok(());
        }

        loop {
            line.clear();

            let Ok(read) = timeout(Duration::from_secs(10), reader.read_line(&mut line)).await
            else {
                return Ok(());
            };
            if read? == 0 {
                return Ok(());
            }

            let command_line = line.trim();
            let (verb, argument) = command_line
                .split_once(' ')
                .unwrap_or((command_line, ""));

            let (response, command) = match verb.to_uppercase().as_str() {
                "EHLO" => (script.ehlo(), SmtpCommand::Ehlo(argument.to_string())),
                "HELO" => (
                    Reply::new(250, "Hello").to_bytes(),
                    SmtpCommand::Helo(argument.to_string()),
                ),
                "MAIL" => (
                    Reply::new(250, "OK").to_bytes(),
                    SmtpCommand::MailFrom(argument.to_string()),
                ),
                "RCPT" => (script.rcpt(argument), SmtpCommand::RcptTo(argument.to_string())),
                "DATA" => (
                    Reply::new(354, "Start mail input; end with <CRLF>.<CRLF>").to_bytes(),
                    SmtpCommand::Data,
                ),
                "NOOP" => (script.noop.to_bytes(), SmtpCommand::Noop),
                "RSET" => (Reply::new(250, "OK").to_bytes(), SmtpCommand::Rset),
                "QUIT" => {
                    commands.write().await.push(SmtpCommand::Quit);
                    writer.write_all(&Reply::new(221, "Bye").to_bytes()).await?;
                    writer.flush().await?;
                    return Ok(());
                }
                _ => (
                    Reply::new(500, "Unknown command").to_bytes(),
                    SmtpCommand::Other(command_line.to_string()),
                ),
            };

            commands.write().await.push(command.clone());

            if let Some(delay) = script.response_delay {
                tokio::time::sleep(delay).await;
            }

            writer.write_all(&response).await?;
            writer.flush().await?;

            if command == SmtpCommand::Data {
                let mut content = String::new();

                loop {
                    line.clear();
                    if reader.read_line(&mut line).await? == 0 {
                        return Ok(());
                    }
                    if line.trim_end_matches(['\r', '\n']) == "." {
                        break;
                    }
                    content.push_str(&line);
                }

                commands
                    .write()
                    .await
                    .push(SmtpCommand::MessageContent(content));
                writer.write_all(&script.data_end.to_bytes()).await?;
                writer.flush().await?;
            }
        }
    }
}

/// Builder for configuring a `MockSmtpServer`
pub struct MockSmtpServerBuilder {
    script: Script,
}

impl MockSmtpServerBuilder {
    /// Greet every connection with `code`; 4xx/5xx codes close it straight away
    #[must_use]
    pub fn with_greeting(mut self, code: u16, message: impl Into<String>) -> Self {
        self.script.greeting = Reply::new(code, message);
        self
    }

    #[must_use]
    pub fn with_noop_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.script.noop = Reply::new(code, message);
        self
    }

    #[must_use]
    pub fn with_rcpt_to_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.script.rcpt_to = Reply::new(code, message);
        self
    }

    /// Refuse RCPT TO for one address, accepting everyone else
    #[must_use]
    pub fn rejecting(mut self, recipient: impl Into<String>) -> Self {
        self.script
            .rejected_recipients
            .push(recipient.into().to_lowercase());
        self
    }

    #[must_use]
    pub fn with_data_end_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.script.data_end = Reply::new(code, message);
        self
    }

    #[must_use]
    pub const fn with_response_delay(mut self, delay: Duration) -> Self {
        self.script.response_delay = Some(delay);
        self
    }

    /// Bind to a random local port and start serving
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to a port
    pub async fn build(self) -> Result<MockSmtpServer, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let script = Arc::new(self.script);
        let commands = Arc::new(RwLock::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let shutdown = Arc::new(AtomicBool::new(false));

        let server = MockSmtpServer {
            addr,
            commands: Arc::clone(&commands),
            connections: Arc::clone(&connections),
            shutdown: Arc::clone(&shutdown),
        };

        tokio::spawn(async move {
            while !shutdown.load(Ordering::Relaxed) {
                // Accept with a timeout so the shutdown flag is re-checked
                let Ok(Ok((stream, _peer))) =
                    timeout(Duration::from_millis(100), listener.accept()).await
                else {
                    continue;
                };

                connections.fetch_add(1, Ordering::Relaxed);
                let script = Arc::clone(&script);
                let commands = Arc::clone(&commands);

                tokio::spawn(async move {
                    let _ = MockSmtpServer::handle_client(stream, script, commands).await;
                });
            }
        });

        Ok(server)
    }
}
