//! Sample functions demonstrating the fnkit invocation context

pub mod handlers;
