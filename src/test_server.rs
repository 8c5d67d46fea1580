//! A single-threaded HTTP server that answers a fixed script of requests, for admin API
//! tests.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub enum Reply {
    /// Status code and JSON body.
    Json(u16, &'static str),
    /// Reads the request, then holds the connection open without answering.
    Stall(Duration),
}

pub struct ScriptedServer {
    pub url: String,
    handle: JoinHandle<Vec<String>>,
}

impl ScriptedServer {
    /// Serves one connection per reply, in order.
    pub fn start(replies: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for reply in replies {
                let Ok((stream, _)) = listener.accept() else {
                    break;
                };
                requests.push(serve(stream, reply));
            }
            requests
        });
        Self { url, handle }
    }

    /// `METHOD path` of every request served. Blocks until the whole script has run.
    pub fn requests(self) -> Vec<String> {
        self.handle.join().unwrap()
    }
}

fn serve(mut stream: TcpStream, reply: Reply) -> String {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    let mut content_length = 0;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap();
            }
        }
    }
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).unwrap();

    match reply {
        Reply::Json(status, body) => {
            let _ = write!(
                stream,
                "HTTP/1.1 {status} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
        }
        Reply::Stall(duration) => thread::sleep(duration),
    }
    request_line
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}
