//! Runs the binary against a local listing and checks what lands on stdout.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::process::Command;
use std::thread;

const LISTING: &str = r#"<html><body>
<div class="index_group">
  <div class="details_rows">
    <h3><a href="/news/story-1">Story 1</a></h3>
    <p class="source">The Paypers | 05 Aug 2024</p>
  </div>
</div>
</body></html>"#;

const ARTICLE: &str = r#"<html><body><div class="article">
  <h1>Story 1</h1>
  <div id="pageContainer"><p>Body of story 1.</p></div>
  <table class="category_table"><tr><td class="source">Countries:</td><td>UK</td></tr></table>
</div></body></html>"#;

fn respond(mut stream: TcpStream) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).unwrap() == 0 || header == "\r\n" {
            break;
        }
    }

    let path = request_line.split_whitespace().nth(1).unwrap_or("/");
    let (status, body) = match path {
        "/news/all" => ("200 OK", LISTING),
        "/news/story-1" => ("200 OK", ARTICLE),
        _ => ("404 Not Found", ""),
    };
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).unwrap();
}

fn serve() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            respond(stream);
        }
    });
    format!("http://{addr}/news/all")
}

#[test]
fn test_stdout_carries_only_document_lines() {
    let listing_url = serve();

    let output = Command::new(env!("CARGO_BIN_EXE_paypers_walker"))
        .args(["--listing-url", &listing_url, "--timeout-secs", "5"])
        .env("RUST_LOG", "debug")
        .env_remove("PAYPERS_CONFIG")
        .env_remove("PAYPERS_FROM_DATE")
        .env_remove("PAYPERS_LISTING_URL")
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1, "stdout: {stdout}");
    let document: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(document["title"], "Story 1");
    assert_eq!(document["other"]["countries"], "UK");

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("paypers_walker starting up"));
    assert!(stderr.contains("Execution complete"));
}
