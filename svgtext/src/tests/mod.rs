// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod test_edit;
mod test_flow;
mod test_fonts;
mod test_parse;
mod test_query;
mod utils;
