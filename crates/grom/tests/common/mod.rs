// GROM - Graph Object Mapper
//
// Copyright (c) 2025 Grom Maintainers and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A scripted statement executor for session tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::VecDeque;

use grom::{RowStream, Statement, StatementExecutor, StoreError, WriteSummary};
use grom_core::ResultRow;

/// Records executed statements and replays canned row sets for queries.
#[derive(Default)]
pub struct StubExecutor {
    /// Write statements, in execution order.
    pub executed: Vec<Statement>,
    /// Read/probe statements, in execution order.
    pub queried: Vec<Statement>,
    /// Row sets handed out per query, front first.
    pub responses: VecDeque<Vec<ResultRow>>,
    /// Makes the next execute fail once.
    pub fail_next_execute: Option<StoreError>,
}

impl StubExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one row set for the next query.
    pub fn push_rows(&mut self, rows: Vec<ResultRow>) {
        self.responses.push_back(rows);
    }

    /// The most recent write statement.
    pub fn last_write(&self) -> &Statement {
        match self.executed.last() {
            Some(statement) => statement,
            None => panic!("no write statement executed"),
        }
    }
}

impl StatementExecutor for StubExecutor {
    fn execute(&mut self, statement: &Statement) -> Result<WriteSummary, StoreError> {
        if let Some(error) = self.fail_next_execute.take() {
            return Err(error);
        }
        self.executed.push(statement.clone());
        Ok(WriteSummary::default())
    }

    fn query<'a>(&'a mut self, statement: &Statement) -> Result<RowStream<'a>, StoreError> {
        self.queried.push(statement.clone());
        let rows = self.responses.pop_front().unwrap_or_default();
        Ok(Box::new(rows.into_iter().map(Ok)))
    }
}
