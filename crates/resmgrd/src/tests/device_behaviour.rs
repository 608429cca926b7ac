//! Behavioural tests for sessions sharing one device over the socket.

use std::cell::RefCell;
use std::collections::HashMap;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use resmgr_config::DEFAULT_BUFFER_CAPACITY;

use crate::device::Device;
use crate::tests::support::{Client, RunningServer, wait_until};

#[derive(Default)]
struct SessionWorld {
    server: Option<RunningServer>,
    clients: HashMap<String, Client>,
    replies: HashMap<String, String>,
}

impl SessionWorld {
    fn server(&self) -> &RunningServer {
        self.server.as_ref().expect("server should be running")
    }

    fn client(&mut self, name: &str) -> &mut Client {
        self.clients
            .get_mut(name)
            .unwrap_or_else(|| panic!("client {name} is not connected"))
    }

    fn reply(&self, name: &str) -> &str {
        self.replies
            .get(name)
            .map(String::as_str)
            .unwrap_or_else(|| panic!("client {name} has not sent a request"))
    }
}

#[fixture]
fn world() -> RefCell<SessionWorld> {
    RefCell::new(SessionWorld::default())
}

#[given("a running resource manager")]
fn given_server(world: &RefCell<SessionWorld>) {
    world.borrow_mut().server = Some(RunningServer::start(DEFAULT_BUFFER_CAPACITY));
}

#[given("a running resource manager with capacity {capacity}")]
fn given_server_with_capacity(world: &RefCell<SessionWorld>, capacity: usize) {
    world.borrow_mut().server = Some(RunningServer::start(capacity));
}

#[when("client \"{name}\" connects")]
fn when_client_connects(world: &RefCell<SessionWorld>, name: String) {
    let client = Client::connect(world.borrow().server().socket());
    world.borrow_mut().clients.insert(name, client);
}

#[when("client \"{name}\" sends \"{line}\"")]
fn when_client_sends(world: &RefCell<SessionWorld>, name: String, line: String) {
    let reply = world.borrow_mut().client(&name).request(&line);
    world.borrow_mut().replies.insert(name, reply);
}

#[when("client \"{name}\" disconnects")]
fn when_client_disconnects(world: &RefCell<SessionWorld>, name: String) {
    let mut state = world.borrow_mut();
    let client = state.clients.remove(&name);
    assert!(client.is_some(), "client {name} is not connected");
    drop(client);
    let server = state.server();
    assert!(
        wait_until(|| !server.device().status().writer_active),
        "disconnect should release the writer claim"
    );
}

#[then("client \"{name}\" receives \"{reply}\"")]
fn then_client_receives(world: &RefCell<SessionWorld>, name: String, reply: String) {
    assert_eq!(world.borrow().reply(&name), format!("{reply}\n"));
}

#[then("client \"{name}\" reads back \"{payload}\"")]
fn then_client_reads_back(world: &RefCell<SessionWorld>, name: String, payload: String) {
    assert_eq!(world.borrow().reply(&name), payload);
}

#[then("client \"{name}\" sees the connection close")]
fn then_connection_closes(world: &RefCell<SessionWorld>, name: String) {
    let mut state = world.borrow_mut();
    assert!(state.client(&name).sees_end_of_stream());
    let server = state.server();
    assert!(wait_until(|| server.registry().live_count() == 0));
}

#[scenario(path = "tests/features/device_sessions.feature", index = 0)]
fn fresh_device_status(#[from(world)] world: RefCell<SessionWorld>) {
    drop(world);
}

#[scenario(path = "tests/features/device_sessions.feature", index = 1)]
fn writer_claim_transfers(#[from(world)] world: RefCell<SessionWorld>) {
    drop(world);
}

#[scenario(path = "tests/features/device_sessions.feature", index = 2)]
fn unknown_commands(#[from(world)] world: RefCell<SessionWorld>) {
    drop(world);
}

#[scenario(path = "tests/features/device_sessions.feature", index = 3)]
fn clear_bypasses_ownership(#[from(world)] world: RefCell<SessionWorld>) {
    drop(world);
}

#[scenario(path = "tests/features/device_sessions.feature", index = 4)]
fn writes_truncate_at_capacity(#[from(world)] world: RefCell<SessionWorld>) {
    drop(world);
}

#[scenario(path = "tests/features/device_sessions.feature", index = 5)]
fn quit_closes_connection(#[from(world)] world: RefCell<SessionWorld>) {
    drop(world);
}
