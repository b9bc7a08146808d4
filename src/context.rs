// Copyright (C) 2025 Kevin Exton
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
use std::sync::Arc;
use tokio::sync::Mutex;

/// One request's (or the whole application's) slot for a cluster handle.
///
/// Cloning shares the slot, so the copy handed to a handler through request
/// extensions and the copy kept by the middleware see the same handle.
pub struct AppContext<C> {
    slot: Arc<Mutex<Option<Arc<C>>>>,
}

impl<C> AppContext<C> {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// The handle currently held, if any.
    pub async fn cluster(&self) -> Option<Arc<C>> {
        self.slot.lock().await.clone()
    }

    pub async fn take(&self) -> Option<Arc<C>> {
        self.slot.lock().await.take()
    }

    pub(crate) fn slot(&self) -> &Mutex<Option<Arc<C>>> {
        &self.slot
    }
}

impl<C> Clone for AppContext<C> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<C> Default for AppContext<C> {
    fn default() -> Self {
        Self::new()
    }
}
