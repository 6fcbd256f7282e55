//! These models represent the objects passed around by the agent
//!
//! There are several related formats to interact with:
//! - chat requests sent from the client to the query service
//! - openai-compatible messages/tools, sent from the agent to the LLM
//! - tool calls, sent from the agent to the toolkits providing capabilities
//!
//! These overlap to varying degrees. Incoming data is converted into the
//! internal structs immediately; because of the need for compatibility, the
//! internal models are not an exact match of any wire format.
pub mod content;
pub mod message;
pub mod role;
pub mod tool;
