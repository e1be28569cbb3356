//! # Storefront Core
//!
//! Client-side state for a mobile storefront app: a shopping cart and a
//! favorites list, each persisted to local storage. Built on LMDB and meant
//! to be linked into a Flutter or React Native host through FFI.
//!
//! ## Features
//!
//! - **Cart store**: one line per product, quantity bookkeeping, count and total
//! - **Favorites store**: unique entries per product, membership queries
//! - **Local persistence**: each store mirrors its collection into one LMDB slot
//! - **Non-blocking writes**: a single writer per slot, newest snapshot wins
//! - **Forgiving startup**: missing or corrupt slots start empty and are logged
//!
//! ## Quick Start
//!
//! ```no_run
//! use storefront_core::{
//!     cart_add_item, cart_summary, close_storefront, create_storefront, free_response,
//! };
//! use std::ffi::CString;
//!
//! let config = CString::new(r#"{"db_name":"shop"}"#).unwrap();
//! let storefront = create_storefront(config.as_ptr());
//!
//! let item = CString::new(r#"{"id":"1","name":"Phone","price":100.0}"#).unwrap();
//! free_response(cart_add_item(storefront, item.as_ptr()));
//! free_response(cart_summary(storefront));
//! free_response(close_storefront(storefront));
//! ```
//!
//! ## FFI Functions
//!
//! Every function except [`create_storefront`] returns a JSON [`AppResponse`]
//! envelope as a C string. Release it with [`free_response`].
//!
//! - [`create_storefront`] - Open storage and hydrate both stores
//! - [`cart_add_item`], [`cart_remove_item`], [`cart_update_quantity`], [`cart_clear`]
//! - [`cart_get_all`], [`cart_find_by_id`], [`cart_summary`]
//! - [`favorites_add`], [`favorites_remove`], [`favorites_toggle`], [`favorites_clear_all`]
//! - [`favorites_is_favorite`], [`favorites_get_all`]
//! - [`storefront_reset`] - Empty both stores and delete their slots
//! - [`close_storefront`] - Flush pending writes and release the handle
//!
//! The Rust API ([`Storefront`], [`cart_store::CartStore`],
//! [`favorites_store::FavoritesStore`]) can be used directly as well.

pub mod app_response;
pub mod cart_store;
pub mod config;
pub mod error;
pub mod favorites_store;
pub mod local_db_state;
pub mod model;
pub mod persistence;
pub mod storage;
pub mod storefront;

pub use crate::app_response::AppResponse;
pub use crate::config::StorefrontConfig;
pub use crate::error::StoreError;
pub use crate::storefront::Storefront;

use crate::model::{validate_price, FavoriteEntry, NewCartLine};

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde_json::json;

/// Opens the storefront described by a JSON [`StorefrontConfig`].
///
/// # Parameters
///
/// * `config_json` - Null-terminated JSON config, or null for the defaults
///
/// # Returns
///
/// A pointer to the [`Storefront`], or null if the config is invalid or the
/// storage backend cannot be opened. Release it with [`close_storefront`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use storefront_core::create_storefront;
///
/// let config = CString::new(r#"{"db_name":"shop","backend":"lmdb"}"#).unwrap();
/// let storefront = create_storefront(config.as_ptr());
///
/// if !storefront.is_null() {
///     // Stores are hydrated and ready
/// }
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_storefront(config_json: *const c_char) -> *mut Storefront {
    let config = if config_json.is_null() {
        StorefrontConfig::default()
    } else {
        let raw = match unsafe { CStr::from_ptr(config_json).to_str() } {
            Ok(s) => s,
            Err(e) => {
                warn!("Invalid UTF-8 in config parameter: {e}");
                return std::ptr::null_mut();
            }
        };
        match StorefrontConfig::from_json(raw) {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid storefront config: {e}");
                return std::ptr::null_mut();
            }
        }
    };

    info!("Opening storefront '{}' ({:?} backend)", config.db_name, config.backend);

    match Storefront::open(config) {
        Ok(storefront) => Box::into_raw(Box::new(storefront)),
        Err(e) => {
            warn!("Failed to open storefront: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Adds one unit of a product to the cart.
///
/// Expects `{"id", "name", "price", "image"?}`. Returns the cart lines after
/// the update.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use storefront_core::{create_storefront, cart_add_item};
///
/// let storefront = create_storefront(std::ptr::null());
/// let item = CString::new(r#"{"id":"2","name":"Laptop","price":1000.0}"#).unwrap();
/// let result = cart_add_item(storefront, item.as_ptr());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn cart_add_item(state: *mut Storefront, json_ptr: *const c_char) -> *const c_char {
    let storefront = match storefront_mut(state, "cart_add_item") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let item: NewCartLine = match parse_json(json_ptr, "item JSON") {
        Ok(item) => item,
        Err(err) => return err,
    };

    if let Err(msg) = validate_price(item.price) {
        return response_to_c_string(&AppResponse::ValidationError(msg));
    }

    storefront.cart.add_item(item);
    response_to_c_string(&AppResponse::json(&storefront.cart.lines()))
}

/// Removes a product's line from the cart. Unknown ids are not an error.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn cart_remove_item(state: *mut Storefront, id: *const c_char) -> *const c_char {
    let storefront = match storefront_mut(state, "cart_remove_item") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    storefront.cart.remove_item(&id_str);
    response_to_c_string(&AppResponse::json(&storefront.cart.lines()))
}

/// Sets a line's quantity. A quantity of zero or less removes the line.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use storefront_core::{create_storefront, cart_update_quantity};
///
/// let storefront = create_storefront(std::ptr::null());
/// let id = CString::new("1").unwrap();
/// let result = cart_update_quantity(storefront, id.as_ptr(), 5);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn cart_update_quantity(
    state: *mut Storefront,
    id: *const c_char,
    quantity: i64,
) -> *const c_char {
    let storefront = match storefront_mut(state, "cart_update_quantity") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    storefront.cart.update_quantity(&id_str, quantity);
    response_to_c_string(&AppResponse::json(&storefront.cart.lines()))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn cart_clear(state: *mut Storefront) -> *const c_char {
    let storefront = match storefront_mut(state, "cart_clear") {
        Ok(s) => s,
        Err(err) => return err,
    };

    storefront.cart.clear();
    response_to_c_string(&AppResponse::success("Cart cleared successfully"))
}

/// Returns every cart line in insertion order.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn cart_get_all(state: *mut Storefront) -> *const c_char {
    let storefront = match storefront_mut(state, "cart_get_all") {
        Ok(s) => s,
        Err(err) => return err,
    };

    response_to_c_string(&AppResponse::json(&storefront.cart.lines()))
}

/// Returns the line for `id`, or a `NotFound` envelope.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn cart_find_by_id(state: *mut Storefront, id: *const c_char) -> *const c_char {
    let storefront = match storefront_mut(state, "cart_find_by_id") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    match storefront.cart.find_by_id(&id_str) {
        Some(line) => response_to_c_string(&AppResponse::json(line)),
        None => {
            let not_found = AppResponse::NotFound(format!("No cart line with id: {id_str}"));
            response_to_c_string(&not_found)
        }
    }
}

/// Returns `{"item_count", "total_price", "line_count"}` for the cart badge
/// and checkout summary.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn cart_summary(state: *mut Storefront) -> *const c_char {
    let storefront = match storefront_mut(state, "cart_summary") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let summary = json!({
        "item_count": storefront.cart.item_count(),
        "total_price": storefront.cart.total_price(),
        "line_count": storefront.cart.len(),
    });
    response_to_c_string(&AppResponse::json(&summary))
}

/// Marks a product as a favorite.
///
/// Expects `{"id", "name", "price", "details"?, "image"?}`. Adding an id that
/// is already a favorite leaves the list unchanged. Returns the favorites
/// after the call.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn favorites_add(state: *mut Storefront, json_ptr: *const c_char) -> *const c_char {
    let storefront = match storefront_mut(state, "favorites_add") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let entry: FavoriteEntry = match parse_json(json_ptr, "favorite JSON") {
        Ok(entry) => entry,
        Err(err) => return err,
    };

    if let Err(msg) = validate_price(entry.price) {
        return response_to_c_string(&AppResponse::ValidationError(msg));
    }

    storefront.favorites.add_favorite(entry);
    response_to_c_string(&AppResponse::json(&storefront.favorites.entries()))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn favorites_remove(state: *mut Storefront, id: *const c_char) -> *const c_char {
    let storefront = match storefront_mut(state, "favorites_remove") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    storefront.favorites.remove_favorite(&id_str);
    response_to_c_string(&AppResponse::json(&storefront.favorites.entries()))
}

/// Flips a product's favorite state. Returns `{"id", "is_favorite"}`.
///
/// The price is validated only when the toggle adds the entry.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use storefront_core::{create_storefront, favorites_toggle};
///
/// let storefront = create_storefront(std::ptr::null());
/// let entry = CString::new(
///     r#"{"id":"2","name":"Laptop","price":1000.0,"details":"M4"}"#,
/// ).unwrap();
/// let result = favorites_toggle(storefront, entry.as_ptr());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn favorites_toggle(state: *mut Storefront, json_ptr: *const c_char) -> *const c_char {
    let storefront = match storefront_mut(state, "favorites_toggle") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let entry: FavoriteEntry = match parse_json(json_ptr, "favorite JSON") {
        Ok(entry) => entry,
        Err(err) => return err,
    };

    if !storefront.favorites.is_favorite(&entry.id) {
        if let Err(msg) = validate_price(entry.price) {
            return response_to_c_string(&AppResponse::ValidationError(msg));
        }
    }

    let id = entry.id.clone();
    let is_favorite = storefront.favorites.toggle_favorite(entry);
    response_to_c_string(&AppResponse::json(&json!({ "id": id, "is_favorite": is_favorite })))
}

/// Returns `Ok("true")` or `Ok("false")`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn favorites_is_favorite(state: *mut Storefront, id: *const c_char) -> *const c_char {
    let storefront = match storefront_mut(state, "favorites_is_favorite") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let id_str = match c_ptr_to_string(id, "id") {
        Ok(id) => id,
        Err(error_ptr) => return error_ptr,
    };

    response_to_c_string(&AppResponse::json(&storefront.favorites.is_favorite(&id_str)))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn favorites_get_all(state: *mut Storefront) -> *const c_char {
    let storefront = match storefront_mut(state, "favorites_get_all") {
        Ok(s) => s,
        Err(err) => return err,
    };

    response_to_c_string(&AppResponse::json(&storefront.favorites.entries()))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn favorites_clear_all(state: *mut Storefront) -> *const c_char {
    let storefront = match storefront_mut(state, "favorites_clear_all") {
        Ok(s) => s,
        Err(err) => return err,
    };

    storefront.favorites.clear_all();
    response_to_c_string(&AppResponse::success("All favorites cleared successfully"))
}

/// Empties the cart and favorites and deletes both slots from storage. The
/// handle stays open.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn storefront_reset(state: *mut Storefront) -> *const c_char {
    let storefront = match storefront_mut(state, "storefront_reset") {
        Ok(s) => s,
        Err(err) => return err,
    };

    match storefront.reset() {
        Ok(()) => response_to_c_string(&AppResponse::success("Storefront reset successfully")),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Flushes pending writes, closes storage and frees the handle.
///
/// The pointer must come from [`create_storefront`] and must not be used
/// after this call.
///
/// # Notes
///
/// Before a Flutter hot restart, call this so the next [`create_storefront`]
/// sees every write made in this session.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_storefront(state: *mut Storefront) -> *const c_char {
    if state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to close_storefront".to_string());
        return response_to_c_string(&error);
    }

    let storefront = unsafe { Box::from_raw(state) };

    match storefront.close() {
        Ok(()) => {
            let success = AppResponse::Ok("Storefront closed successfully".to_string());
            response_to_c_string(&success)
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Frees a response string returned by any function in this library.
/// Null is ignored.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr as *mut c_char) });
}

/// Converts an [`AppResponse`] to a C string owned by the caller.
///
/// Returns a null pointer if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust String.
///
/// On failure the `Err` side already holds the `BadRequest` response to
/// hand back to the caller.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn parse_json<T: DeserializeOwned>(ptr: *const c_char, field_name: &str) -> Result<T, *const c_char> {
    let raw = c_ptr_to_string(ptr, field_name)?;
    serde_json::from_str(&raw).map_err(|e| {
        let error = AppResponse::SerializationError(format!("Invalid {field_name}: {e}"));
        response_to_c_string(&error)
    })
}

fn storefront_mut<'a>(state: *mut Storefront, fn_name: &str) -> Result<&'a mut Storefront, *const c_char> {
    match unsafe { state.as_mut() } {
        Some(s) => Ok(s),
        None => {
            let error = AppResponse::BadRequest(format!("Null state pointer passed to {fn_name}"));
            Err(response_to_c_string(&error))
        }
    }
}
