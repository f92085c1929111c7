//! Test support for exercising the SMTP transport over real sockets

#![allow(dead_code)]

pub mod mock_server;
