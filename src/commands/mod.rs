// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod backup;
pub mod exporter;
pub mod links;
pub mod nodes;
pub mod profiles;
pub mod reports;
pub mod sim;
pub mod strategy;
