//! Client core for the FME Server REST/WebSocket API and the FME Cloud API.
//!
//! # Overview
//! Every endpoint is split into a pure `build_*` method that produces an
//! `HttpRequest` and a dispatching method that sends it and hands the
//! normalized `Response` to a continuation. Hosts that do their own I/O use
//! the builders plus `Response::interpret`; everyone else uses the
//! dispatching methods.
//!
//! # Design
//! - Configuration belongs to one connection object; there is no global state.
//! - Payload kinds are explicit (`Payload::Form`, `Json`, `Text`, `Binary`)
//!   and set the `Content-Type` header when attached.
//! - A dispatched request completes with exactly one `Response`, success or
//!   not. Only configuration mistakes are reported as errors.

/// Generate dispatching methods from `build_*` methods that cannot fail.
macro_rules! dispatch_methods {
    ($( $(#[$meta:meta])* $name:ident => $build:ident ( $($arg:ident : $ty:ty),* ); )*) => {
        $(
            $(#[$meta])*
            #[doc = concat!("\n\nSends [`Self::", stringify!($build), "`] and passes the `Response` to `on_complete`.")]
            pub fn $name(
                &self,
                $($arg: $ty,)*
                on_complete: impl Into<$crate::dispatch::Continuation>,
            ) {
                let request = self.$build($($arg),*);
                self.dispatcher.dispatch(request, on_complete);
            }
        )*
    };
}

/// Same as `dispatch_methods!` for builders that serialize a body and may fail.
macro_rules! try_dispatch_methods {
    ($( $(#[$meta:meta])* $name:ident => $build:ident ( $($arg:ident : $ty:ty),* ); )*) => {
        $(
            $(#[$meta])*
            #[doc = concat!("\n\nSends [`Self::", stringify!($build), "`] and passes the `Response` to `on_complete`. Fails only when the body cannot be serialized.")]
            pub fn $name(
                &self,
                $($arg: $ty,)*
                on_complete: impl Into<$crate::dispatch::Continuation>,
            ) -> $crate::error::Result<()> {
                let request = self.$build($($arg),*)?;
                self.dispatcher.dispatch(request, on_complete);
                Ok(())
            }
        )*
    };
}

pub mod cloud;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod response;
pub mod server;
pub mod websocket;

pub use cloud::FmeCloud;
pub use config::{CloudConfig, Detail, OutputFormat, ServerConfig};
pub use dispatch::{Continuation, Dispatcher, ReqwestTransport, Transport};
pub use error::{ApiError, ConfigError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Payload};
pub use response::Response;
pub use server::{session_id, FmeServer, TimeUnit, UploadOptions};
pub use websocket::NotificationStream;
