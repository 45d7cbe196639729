// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstractions

pub mod camera;
