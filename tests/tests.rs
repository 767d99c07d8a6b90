// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod pattern;
mod schema;
mod source;
