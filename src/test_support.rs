//! Throwaway HTTP server for tests.

use std::io::Read;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tiny_http::{Response, Server};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: String,
    pub content_type: Option<String>,
}

/// Serves every request with `respond(request) -> (status, body)` and records it.
pub struct TestServer {
    pub origin: String,
    server: Arc<Server>,
    requests: Arc<Mutex<Vec<Recorded>>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    pub fn start<F>(respond: F) -> Self
    where
        F: Fn(&Recorded) -> (u16, Vec<u8>) + Send + 'static,
    {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let port = server.server_addr().to_ip().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let server = Arc::clone(&server);
            let requests = Arc::clone(&requests);
            std::thread::spawn(move || {
                for mut request in server.incoming_requests() {
                    let mut body = String::new();
                    let _ = request.as_reader().read_to_string(&mut body);
                    let recorded = Recorded {
                        method: request.method().to_string(),
                        path: request.url().to_string(),
                        body,
                        content_type: request
                            .headers()
                            .iter()
                            .find(|h| h.field.equiv("Content-Type"))
                            .map(|h| h.value.to_string()),
                    };
                    let (status, data) = respond(&recorded);
                    requests.lock().push(recorded);
                    let _ = request.respond(Response::from_data(data).with_status_code(status));
                }
            })
        };

        Self {
            origin: format!("http://127.0.0.1:{port}"),
            server,
            requests,
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
