//! Minimal HTTP/1.1 server imitating a Drupal site with Backup and Migrate.
//!
//! Serves the backup page at `BACKUP_PATH` (403 with a login form until the
//! session cookie is set), accepts the login form at `/user/login` and answers
//! the backup form with the dump as an attachment. Every request is recorded.
//! Each connection handles one request and is then closed.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const BACKUP_PATH: &str = "/admin/config/system/backup_migrate";
const SESSION_COOKIE: &str = "SESSrdump=abc123";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl RecordedRequest {
    /// Decoded value of `name` in a urlencoded body.
    pub fn form_value(&self, name: &str) -> Option<String> {
        url::form_urlencoded::parse(self.body.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}

/// How the login form answers good credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginReply {
    /// 302 to the backup page.
    Redirect,
    /// 200 page that moves on with `<meta http-equiv="refresh">`.
    Interstitial,
}

#[derive(Debug, Clone)]
pub struct DrupalSiteOptions {
    pub require_login: bool,
    pub user: &'static str,
    pub password: &'static str,
    pub login_reply: LoginReply,
    /// Status of the backup page regardless of login (e.g. 500).
    pub forced_status: Option<u16>,
    /// `None`: the backup form answers with the page again, no file.
    pub dump: Option<(&'static str, Vec<u8>)>,
}

impl Default for DrupalSiteOptions {
    fn default() -> Self {
        Self {
            require_login: false,
            user: "alice",
            password: "secret",
            login_reply: LoginReply::Redirect,
            forced_status: None,
            dump: Some(("dump.sql.gz", b"0123456789abcdefg".to_vec())),
        }
    }
}

pub struct DrupalSite {
    pub base: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl DrupalSite {
    pub fn backup_url(&self) -> String {
        format!("{}{}", self.base, BACKUP_PATH)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Backup form posts (POSTs to the backup page).
    pub fn backup_posts(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "POST" && r.path == BACKUP_PATH)
            .collect()
    }
}

/// Starts the site in a background thread. It runs until the process exits.
pub fn start(opts: DrupalSiteOptions) -> DrupalSite {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);
    let opts = Arc::new(opts);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let opts = Arc::clone(&opts);
            let recorded = Arc::clone(&recorded);
            thread::spawn(move || handle(stream, &opts, &recorded));
        }
    });
    DrupalSite {
        base: format!("http://127.0.0.1:{}", port),
        requests,
    }
}

/// An address nothing listens on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}{}", port, BACKUP_PATH)
}

struct Request {
    method: String,
    path: String,
    cookie: String,
    body: String,
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    let head_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..head_end]).into_owned();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let path = target.split('?').next().unwrap_or("").to_string();

    let mut content_length = 0usize;
    let mut cookie = String::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            } else if name.eq_ignore_ascii_case("cookie") {
                cookie = value.trim().to_string();
            }
        }
    }

    let mut body = data[head_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
    }

    Some(Request {
        method,
        path,
        cookie,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn handle(mut stream: TcpStream, opts: &DrupalSiteOptions, recorded: &Mutex<Vec<RecordedRequest>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };
    recorded.lock().unwrap().push(RecordedRequest {
        method: req.method.clone(),
        path: req.path.clone(),
        body: req.body.clone(),
    });

    let logged_in = req.cookie.contains(SESSION_COOKIE);
    let response = match (req.method.as_str(), req.path.as_str()) {
        (_, BACKUP_PATH) if opts.forced_status.is_some() => {
            let status = opts.forced_status.unwrap_or(500);
            html(status, &[], "<html><body>Error</body></html>")
        }
        (_, BACKUP_PATH) if opts.require_login && !logged_in => html(403, &[], &login_page()),
        ("GET", BACKUP_PATH) => html(200, &[], &backup_page()),
        ("POST", BACKUP_PATH) => backup_reply(&req, opts),
        ("POST", "/user/login") => login_reply(&req, opts),
        _ => html(404, &[], "<html><body>Page not found</body></html>"),
    };
    let _ = stream.write_all(&response);
    let _ = stream.flush();
}

fn login_reply(req: &Request, opts: &DrupalSiteOptions) -> Vec<u8> {
    let recorded = RecordedRequest {
        method: req.method.clone(),
        path: req.path.clone(),
        body: req.body.clone(),
    };
    let good = recorded.form_value("name").as_deref() == Some(opts.user)
        && recorded.form_value("pass").as_deref() == Some(opts.password)
        && recorded.form_value("form_id").as_deref() == Some("user_login_block");
    if !good {
        return html(403, &[], &login_page());
    }
    let cookie = format!("Set-Cookie: {}; path=/; HttpOnly", SESSION_COOKIE);
    match opts.login_reply {
        LoginReply::Redirect => {
            let location = format!("Location: {}", BACKUP_PATH);
            html(302, &[&cookie, &location], "")
        }
        LoginReply::Interstitial => {
            let page = format!(
                r#"<html><head><meta http-equiv="refresh" content="0; url={}"></head><body>Logging in</body></html>"#,
                BACKUP_PATH
            );
            html(200, &[&cookie], &page)
        }
    }
}

fn backup_reply(req: &Request, opts: &DrupalSiteOptions) -> Vec<u8> {
    let expected = "source_id=db&destination_id=download&profile_id=default";
    let valid = req.body.contains(expected) && req.body.contains("op=Backup+now");
    match (&opts.dump, valid) {
        (Some((name, bytes)), true) => {
            let disposition = format!("Content-Disposition: attachment; filename=\"{}\"", name);
            let mut out = head(200, "application/octet-stream", bytes.len(), &[&disposition]);
            out.extend_from_slice(bytes);
            out
        }
        _ => html(200, &[], &backup_page()),
    }
}

fn login_page() -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>Access denied</title></head><body>
<form action="/user/login?destination={}" method="post" id="user-login-form" accept-charset="UTF-8"><div>
<input type="text" id="edit-name" name="name" value="" size="15" maxlength="60" class="form-text required" />
<input type="password" id="edit-pass" name="pass" size="15" maxlength="128" class="form-text required" />
<input type="hidden" name="form_build_id" value="form-login" />
<input type="hidden" name="form_id" value="user_login_block" />
<input type="submit" id="edit-submit" name="op" value="Log in" class="form-submit" />
</div></form></body></html>"#,
        &BACKUP_PATH[1..]
    )
}

fn backup_page() -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>Backup and Migrate</title></head><body>
<form action="{}" method="post" id="backup-migrate-ui-manual-quick-backup-form" accept-charset="UTF-8"><div>
<select id="edit-source-id" name="source_id" class="form-select"><option value="db" selected="selected">Default Database</option><option value="files">Public Files Directory</option></select>
<select id="edit-destination-id" name="destination_id" class="form-select"><option value="manual">Manual Backups Directory</option><option value="download">Download</option></select>
<select id="edit-profile-id" name="profile_id" class="form-select"><option value="default">Default Settings</option></select>
<input type="submit" id="edit-submit" name="op" value="Backup now" class="form-submit" />
<input type="hidden" name="form_build_id" value="form-backup" />
<input type="hidden" name="form_token" value="tok-42" />
<input type="hidden" name="form_id" value="backup_migrate_ui_manual_quick_backup_form" />
</div></form></body></html>"#,
        BACKUP_PATH
    )
}

fn head(status: u16, content_type: &str, len: usize, extra: &[&str]) -> Vec<u8> {
    let reason = match status {
        200 => "OK",
        302 => "Found",
        403 => "Forbidden",
        404 => "Not Found",
        _ => "Error",
    };
    let mut s = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status, reason, content_type, len
    );
    for h in extra {
        s.push_str(h);
        s.push_str("\r\n");
    }
    s.push_str("\r\n");
    s.into_bytes()
}

fn html(status: u16, extra: &[&str], body: &str) -> Vec<u8> {
    let mut out = head(status, "text/html; charset=utf-8", body.len(), extra);
    out.extend_from_slice(body.as_bytes());
    out
}
