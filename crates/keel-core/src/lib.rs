//! keel-core
//!
//! Application kernel: a dotted-path context store, a service container
//! and an event dispatcher behind a single [`Kernel`] handle.
//!
//! # モジュール構成
//! - **value / object**: 動的な値モデルとオブジェクトのアクセス規約
//! - **path**: ドット区切りパスの解決（map, list, object を横断）
//! - **store**: context の読み書き、一括操作、配列ヘルパー、context hook
//! - **container**: binding, singleton, class 登録, 引数バインディング, call 式
//! - **events**: 優先度付き listener, one-shot, 伝播停止
//! - **cache**: cache driver とフォルダ実装（`CACHE` キーで切り替え）
//! - **config**: `KernelConfig` と環境ヘルパー
//! - **kernel**: `Kernel` と `KernelBuilder`

pub mod cache;
pub mod config;
pub mod container;
pub mod error;
pub mod events;
pub mod kernel;
pub mod object;
pub mod path;
pub mod store;
pub mod value;

#[cfg(test)]
mod testing;

pub use cache::{CacheDriver, CacheDsn, CacheEntry, FolderCache};
pub use config::KernelConfig;
pub use container::Concrete;
pub use container::class::{Class, ClassKind};
pub use container::signature::{Callable, Function, Param, Signature, TypeHint};
pub use error::{KernelError, Result};
pub use events::{Dispatchable, Event, Listener};
pub use kernel::{Kernel, KernelBuilder, slash};
pub use object::{Member, Members, Object};
pub use path::{Location, Lookup};
pub use store::KeyAlias;
pub use value::{Kind, Map, ObjectRef, Value};
