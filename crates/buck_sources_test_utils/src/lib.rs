//! buck_sources Test Utilities
//!
//! In-process stand-ins for the pieces of the resolver that touch the outside
//! world, plus a throwaway project root for laying out `buck-out`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use buck_sources_test_utils::{BuckOutFixture, FakeBuck, MemoryCacheStore, ScriptedConfirm};
//!
//! let fixture = BuckOutFixture::new();
//! let buck = FakeBuck::new().on_query(ToolOutput::success("//x:y buck-out/gen/x/y.par"));
//! let mut cache = MemoryCacheStore::default();
//! let mut confirm = ScriptedConfirm::never_asked();
//! let mut resolver = fixture.resolver(&buck, &mut cache, &mut confirm);
//! ```

pub mod fake_buck;
pub mod fixture;
pub mod memory;

pub use fake_buck::{BuildEffect, FakeBuck};
pub use fixture::BuckOutFixture;
pub use memory::{MemoryCacheStore, ScriptedConfirm};
