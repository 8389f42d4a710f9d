//! WebSocket Hub
//!
//! In-process realtime hub used when Beacon runs in `local` broadcast mode.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Tracks connections and the channel each one joined
//! - **Handler**: Verifies the negotiated token and runs the connection
//! - **Messages**: Client and server frame formats
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const info = await (await fetch('/negotiate', {method: 'POST'})).json();
//! const ws = new WebSocket(
//!   info.url.replace(/^http/, 'ws') + '&access_token=' + info.accessToken);
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'invocation' && msg.target === 'newEvent') {
//!     console.log('CloudEvent:', JSON.parse(msg.arguments[0]));
//!   }
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::{websocket_handler, ClientParams};
pub use hub::{ConnectionHub, ConnectionId, HubConfig, HubError};
pub use messages::{ClientMessage, ServerMessage};
