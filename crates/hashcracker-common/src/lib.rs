// Copyright (c) The Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Types shared between the manager and worker binaries: the wire DTOs
//! exchanged over HTTP, the indexed search-space codec, and the error
//! kinds common to both sides.

mod error;
mod search_space;
mod wire;

pub use error::Error;
pub use search_space::SearchSpace;
pub use wire::{
    CrackRequest, CrackResponse, Status, StatusResponse, Task, TaskProgress,
};
