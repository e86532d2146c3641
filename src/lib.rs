// This file is part of ts_face_controller.
//
// See the COPYRIGHT file at the top-level directory of this distribution
// for details of code ownership.
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
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! # Face Controller
//!
//! This library drives the servos of an animatronic face from the face
//! landmarks of a vision pipeline. Each frame is normalized against the head
//! roll and the eye distance, resolved to the servo angles by a declarative
//! mapping table, and dispatched to the serial link only for the channels
//! whose angle changed.
pub mod application;
pub mod command;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod face;
pub mod interface;
pub mod mock;
pub mod model;
pub mod telemetry;
pub mod utility;
