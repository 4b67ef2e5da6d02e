//! FTP implementation of the source traits.
//!
//! `suppaftp`'s stream is blocking, so every call runs on the blocking
//! pool. The stream is moved into the blocking task and handed back when
//! the call returns.

use std::fmt;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use suppaftp::{FtpError, FtpResult, FtpStream};
use suppaftp::types::FileType;
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::session::{SourceConnector, SourceFuture, SourceSession};
use crate::types::{FileContent, SourceEntry};

/// Default FTP control port.
pub const DEFAULT_FTP_PORT: u16 = 21;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(120);
const ANONYMOUS_USER: &str = "anonymous";
const ANONYMOUS_PASSWORD: &str = "anonymous@";

/// Connection settings for the FTP source.
#[derive(Clone)]
pub struct FtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Timeout for establishing the control connection.
    pub connect_timeout: Duration,
    /// Read timeout applied to the control connection.
    pub read_timeout: Duration,
}

impl FtpSettings {
    /// Creates settings with the default port and timeouts.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_FTP_PORT,
            user: user.into(),
            password: password.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Password sent on login. Anonymous logins without a password send
    /// the conventional `anonymous@`.
    pub fn login_password(&self) -> &str {
        if self.password.is_empty() && self.user.eq_ignore_ascii_case(ANONYMOUS_USER) {
            ANONYMOUS_PASSWORD
        } else {
            &self.password
        }
    }
}

impl fmt::Debug for FtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

/// Opens FTP sessions with fixed settings.
#[derive(Debug, Clone)]
pub struct FtpConnector {
    settings: FtpSettings,
}

impl FtpConnector {
    pub fn new(settings: FtpSettings) -> Self {
        Self { settings }
    }
}

impl SourceConnector for FtpConnector {
    fn connect(&self) -> SourceFuture<'_, Box<dyn SourceSession>> {
        let settings = self.settings.clone();
        Box::pin(async move {
            let host = format!("{}:{}", settings.host, settings.port);
            let stream = tokio::task::spawn_blocking(move || open_stream(&settings))
                .await
                .map_err(|e| SourceError::Connection(format!("task join error: {e}")))??;

            info!(host = %host, "connected to FTP server");
            Ok(Box::new(FtpSession {
                stream: Some(stream),
                host,
            }) as Box<dyn SourceSession>)
        })
    }
}

/// Connects, logs in and switches to binary mode.
fn open_stream(settings: &FtpSettings) -> Result<FtpStream, SourceError> {
    let addr = resolve(&settings.host, settings.port)?;

    let (connect_timeout, read_timeout) = (settings.connect_timeout, settings.read_timeout);
    let mut stream = FtpStream::connect_timeout(addr, connect_timeout)
        .map_err(|e| SourceError::Connection(format!("{addr}: {e}")))?
        .passive_stream_builder(move |data_addr| {
            open_data_stream(data_addr, connect_timeout, read_timeout)
        });

    stream
        .get_ref()
        .set_read_timeout(Some(settings.read_timeout))
        .map_err(|e| SourceError::Connection(format!("cannot set read timeout: {e}")))?;

    if let Err(e) = stream.login(settings.user.as_str(), settings.login_password()) {
        let _ = stream.quit();
        return Err(SourceError::Connection(format!(
            "login as {} rejected: {e}",
            settings.user
        )));
    }

    stream
        .transfer_type(FileType::Binary)
        .map_err(|e| SourceError::Connection(format!("cannot switch to binary mode: {e}")))?;

    Ok(stream)
}

/// Opens a passive data connection with the same timeouts as the control
/// connection, so a stalled transfer fails instead of blocking the cycle.
fn open_data_stream(
    addr: impl ToSocketAddrs,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> FtpResult<TcpStream> {
    let addr = addr
        .to_socket_addrs()
        .map_err(FtpError::ConnectionError)?
        .next()
        .ok_or_else(|| {
            FtpError::ConnectionError(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no address for data connection",
            ))
        })?;

    let data =
        TcpStream::connect_timeout(&addr, connect_timeout).map_err(FtpError::ConnectionError)?;
    data.set_read_timeout(Some(read_timeout))
        .map_err(FtpError::ConnectionError)?;
    Ok(data)
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, SourceError> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| SourceError::Connection(format!("cannot resolve {host}:{port}: {e}")))?
        .next()
        .ok_or_else(|| SourceError::Connection(format!("no address found for {host}:{port}")))
}

/// One authenticated FTP control connection.
pub struct FtpSession {
    stream: Option<FtpStream>,
    host: String,
}

impl FtpSession {
    /// Runs a blocking operation against the stream on the blocking pool.
    async fn with_stream<T, F>(&mut self, op: F) -> Result<T, SourceError>
    where
        F: FnOnce(&mut FtpStream) -> Result<T, SourceError> + Send + 'static,
        T: Send + 'static,
    {
        let mut stream = self.stream.take().ok_or(SourceError::Closed)?;
        let (stream, result) = tokio::task::spawn_blocking(move || {
            let result = op(&mut stream);
            (stream, result)
        })
        .await
        .map_err(|e| SourceError::Connection(format!("task join error: {e}")))?;

        self.stream = Some(stream);
        result
    }
}

impl SourceSession for FtpSession {
    fn change_directory<'a>(&'a mut self, path: &'a str) -> SourceFuture<'a, ()> {
        Box::pin(async move {
            let path = path.to_string();
            self.with_stream(move |stream| {
                stream.cwd(&path).map_err(|e| SourceError::Directory {
                    path: path.clone(),
                    reason: e.to_string(),
                })
            })
            .await
        })
    }

    fn list_entries(&mut self) -> SourceFuture<'_, Vec<SourceEntry>> {
        Box::pin(async move {
            let names = self
                .with_stream(|stream| {
                    stream
                        .nlst(None)
                        .map_err(|e| SourceError::List(e.to_string()))
                })
                .await?;

            let entries = SourceEntry::from_listing(names);
            debug!(host = %self.host, entries = entries.len(), "listed directory");
            Ok(entries)
        })
    }

    fn fetch_content<'a>(&'a mut self, entry: &'a SourceEntry) -> SourceFuture<'a, FileContent> {
        Box::pin(async move {
            let name = entry.name().to_string();
            self.with_stream(move |stream| {
                stream
                    .retr_as_buffer(&name)
                    .map(|cursor| FileContent::new(cursor.into_inner()))
                    .map_err(|e| SourceError::Fetch {
                        name: name.clone(),
                        reason: e.to_string(),
                    })
            })
            .await
        })
    }

    fn delete_entry<'a>(&'a mut self, entry: &'a SourceEntry) -> SourceFuture<'a, ()> {
        Box::pin(async move {
            let name = entry.name().to_string();
            self.with_stream(move |stream| {
                stream.rm(&name).map_err(|e| SourceError::Delete {
                    name: name.clone(),
                    reason: e.to_string(),
                })
            })
            .await
        })
    }

    fn close(mut self: Box<Self>) -> SourceFuture<'static, ()> {
        Box::pin(async move {
            let Some(mut stream) = self.stream.take() else {
                return Ok(());
            };
            let host = self.host.clone();

            tokio::task::spawn_blocking(move || stream.quit())
                .await
                .map_err(|e| SourceError::Connection(format!("task join error: {e}")))?
                .map_err(|e| SourceError::Connection(format!("quit failed: {e}")))?;

            debug!(host = %host, "FTP session closed");
            Ok(())
        })
    }
}

impl Drop for FtpSession {
    fn drop(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };
        warn!(host = %self.host, "FTP session dropped without close, releasing connection");

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || {
                    let _ = stream.quit();
                });
            }
            Err(_) => {
                let _ = stream.quit();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::{Arc, Mutex};
    use std::thread::JoinHandle;

    /// Shared state of the scripted FTP server.
    #[derive(Default)]
    struct FakeFtp {
        files: HashMap<String, Vec<u8>>,
        dirs: Vec<String>,
        /// Files whose RETR opens the data connection and never sends.
        stalled: Vec<String>,
        commands: Vec<String>,
    }

    /// Serves a single control connection with a minimal FTP dialect:
    /// USER/PASS/TYPE/CWD/PASV/NLST/RETR/DELE/QUIT.
    fn fake_ftp_server(state: Arc<Mutex<FakeFtp>>, password: &str) -> (u16, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let password = password.to_string();

        let handle = std::thread::spawn(move || {
            let Ok((mut control, _)) = listener.accept() else {
                return;
            };
            let mut reader = BufReader::new(control.try_clone().unwrap());
            let mut data_listener: Option<TcpListener> = None;
            let mut held = Vec::new();
            let _ = control.write_all(b"220 fake ready\r\n");

            let mut line = String::new();
            loop {
                line.clear();
                if reader.read_line(&mut line).unwrap_or(0) == 0 {
                    return;
                }
                let cmd = line.trim_end().to_string();
                state.lock().unwrap().commands.push(cmd.clone());
                let (verb, arg) = cmd.split_once(' ').unwrap_or((cmd.as_str(), ""));

                let reply = match verb {
                    "USER" => "331 need password".to_string(),
                    "PASS" if arg == password => "230 logged in".to_string(),
                    "PASS" => "530 login incorrect".to_string(),
                    "TYPE" => "200 type set".to_string(),
                    "CWD" if state.lock().unwrap().dirs.iter().any(|d| d == arg) => {
                        "250 directory changed".to_string()
                    }
                    "CWD" => "550 no such directory".to_string(),
                    "PASV" => {
                        let dl = TcpListener::bind("127.0.0.1:0").unwrap();
                        let p = dl.local_addr().unwrap().port();
                        data_listener = Some(dl);
                        format!("227 Entering Passive Mode (127,0,0,1,{},{})", p / 256, p % 256)
                    }
                    "NLST" => {
                        let names: Vec<String> =
                            state.lock().unwrap().files.keys().cloned().collect();
                        let mut body = names.join("\r\n");
                        if !body.is_empty() {
                            body.push_str("\r\n");
                        }
                        send_data(&mut control, data_listener.take(), body.as_bytes());
                        "226 transfer complete".to_string()
                    }
                    "RETR" if state.lock().unwrap().stalled.iter().any(|f| f == arg) => {
                        let _ = control.write_all(b"150 opening data connection\r\n");
                        if let Some(Ok((data, _))) = data_listener.take().map(|l| l.accept()) {
                            held.push(data);
                        }
                        "426 transfer aborted".to_string()
                    }
                    "RETR" => {
                        let content = state.lock().unwrap().files.get(arg).cloned();
                        match content {
                            Some(bytes) => {
                                send_data(&mut control, data_listener.take(), &bytes);
                                "226 transfer complete".to_string()
                            }
                            None => "550 no such file".to_string(),
                        }
                    }
                    "DELE" => match state.lock().unwrap().files.remove(arg) {
                        Some(_) => "250 deleted".to_string(),
                        None => "550 no such file".to_string(),
                    },
                    "QUIT" => {
                        let _ = control.write_all(b"221 bye\r\n");
                        return;
                    }
                    _ => "502 not implemented".to_string(),
                };
                let _ = control.write_all(format!("{reply}\r\n").as_bytes());
            }
        });

        (port, handle)
    }

    fn send_data(control: &mut TcpStream, listener: Option<TcpListener>, bytes: &[u8]) {
        let _ = control.write_all(b"150 opening data connection\r\n");
        if let Some(listener) = listener
            && let Ok((mut data, _)) = listener.accept()
        {
            let _ = data.write_all(bytes);
            let _ = data.flush();
        }
    }

    fn settings(port: u16, password: &str) -> FtpSettings {
        FtpSettings {
            port,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
            ..FtpSettings::new("127.0.0.1", "drop", password)
        }
    }

    #[test]
    fn anonymous_login_password() {
        let s = FtpSettings::new("h", "anonymous", "");
        assert_eq!(s.login_password(), "anonymous@");

        let s = FtpSettings::new("h", "anonymous", "me@example.com");
        assert_eq!(s.login_password(), "me@example.com");

        let s = FtpSettings::new("h", "scanner", "");
        assert_eq!(s.login_password(), "");
    }

    #[test]
    fn settings_debug_redacts_password() {
        let s = FtpSettings::new("ftp.local", "scanner", "hunter2");
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("ftp.local"));
    }

    #[test]
    fn settings_defaults() {
        let s = FtpSettings::new("ftp.local", "u", "p");
        assert_eq!(s.port, DEFAULT_FTP_PORT);
        assert_eq!(s.connect_timeout, Duration::from_secs(30));
        assert_eq!(s.read_timeout, Duration::from_secs(120));
    }

    #[tokio::test]
    async fn connect_refused_is_connection_error() {
        // Grab a free port and release it so nothing is listening.
        let port = {
            let l = TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let connector = FtpConnector::new(settings(port, "pw"));
        let err = connector.connect().await.err().unwrap();
        assert!(matches!(err, SourceError::Connection(_)), "got {err}");
    }

    #[tokio::test]
    async fn rejected_login_is_connection_error() {
        let state = Arc::new(Mutex::new(FakeFtp::default()));
        let (port, handle) = fake_ftp_server(state, "right");

        let connector = FtpConnector::new(settings(port, "wrong"));
        let err = connector.connect().await.err().unwrap();
        assert!(matches!(err, SourceError::Connection(ref m) if m.contains("rejected")));

        handle.join().unwrap();
    }

    #[tokio::test]
    async fn full_session_against_fake_server() {
        let state = Arc::new(Mutex::new(FakeFtp::default()));
        {
            let mut s = state.lock().unwrap();
            s.dirs.push("/inbox".into());
            s.files.insert("a.pdf".into(), b"%PDF-1.4 a".to_vec());
        }
        let (port, handle) = fake_ftp_server(state.clone(), "pw");

        let connector = FtpConnector::new(settings(port, "pw"));
        let mut session = connector.connect().await.unwrap();

        session.change_directory("/inbox").await.unwrap();

        let entries = session.list_entries().await.unwrap();
        assert_eq!(entries, vec![SourceEntry::new("a.pdf")]);

        let content = session.fetch_content(&entries[0]).await.unwrap();
        assert_eq!(content.as_bytes(), b"%PDF-1.4 a");

        session.delete_entry(&entries[0]).await.unwrap();
        session.close().await.unwrap();
        handle.join().unwrap();

        let s = state.lock().unwrap();
        assert!(s.files.is_empty());
        assert!(s.commands.iter().any(|c| c == "TYPE I"));
        assert_eq!(s.commands.last().map(String::as_str), Some("QUIT"));
    }

    #[tokio::test]
    async fn missing_directory_and_entry_errors() {
        let state = Arc::new(Mutex::new(FakeFtp::default()));
        let (port, handle) = fake_ftp_server(state, "pw");

        let connector = FtpConnector::new(settings(port, "pw"));
        let mut session = connector.connect().await.unwrap();

        let err = session.change_directory("/missing").await.unwrap_err();
        assert!(matches!(err, SourceError::Directory { ref path, .. } if path == "/missing"));

        let ghost = SourceEntry::new("ghost.pdf");
        let err = session.delete_entry(&ghost).await.unwrap_err();
        assert!(matches!(err, SourceError::Delete { ref name, .. } if name == "ghost.pdf"));

        // The session stays usable after a failed command.
        session.close().await.unwrap();
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_fetch_error() {
        let state = Arc::new(Mutex::new(FakeFtp::default()));
        let (port, handle) = fake_ftp_server(state, "pw");

        let connector = FtpConnector::new(settings(port, "pw"));
        let mut session = connector.connect().await.unwrap();

        let ghost = SourceEntry::new("ghost.pdf");
        let err = session.fetch_content(&ghost).await.unwrap_err();
        assert!(matches!(err, SourceError::Fetch { ref name, .. } if name == "ghost.pdf"));

        session.close().await.unwrap();
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn stalled_data_connection_times_out() {
        let state = Arc::new(Mutex::new(FakeFtp::default()));
        {
            let mut s = state.lock().unwrap();
            s.files.insert("slow.pdf".into(), b"never sent".to_vec());
            s.stalled.push("slow.pdf".into());
        }
        let (port, _handle) = fake_ftp_server(state, "pw");

        let connector = FtpConnector::new(FtpSettings {
            read_timeout: Duration::from_secs(1),
            ..settings(port, "pw")
        });
        let mut session = connector.connect().await.unwrap();

        let entry = SourceEntry::new("slow.pdf");
        let result =
            tokio::time::timeout(Duration::from_secs(10), session.fetch_content(&entry)).await;
        let outcome = result.expect("fetch should give up on a silent data connection");
        assert!(matches!(outcome, Err(SourceError::Fetch { ref name, .. }) if name == "slow.pdf"));

        let _ = session.close().await;
    }

    #[tokio::test]
    async fn dropped_session_still_quits() {
        let state = Arc::new(Mutex::new(FakeFtp::default()));
        let (port, handle) = fake_ftp_server(state.clone(), "pw");

        let connector = FtpConnector::new(settings(port, "pw"));
        let session = connector.connect().await.unwrap();
        drop(session);

        handle.join().unwrap();
        let s = state.lock().unwrap();
        assert_eq!(s.commands.last().map(String::as_str), Some("QUIT"));
    }
}
