use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, FnArg, Ident, ItemFn, LitInt, Pat, PatType};

/// Times a function when the `perf_stats` feature of the calling crate is
/// enabled, and logs the elapsed time on exit through Bevy's `info!`.
///
/// Without `perf_stats` the wrapper expands to the original body.
///
/// # Logging rule
/// - Always logs when the call took longer than the threshold (1 ms default)
/// - Also logs every 100 frames when the system takes a `tick: Res<SimFrame>`
///   parameter
///
/// # Example
/// ```ignore
/// #[profile(16)]  // Threshold in milliseconds
/// pub fn step_world(time: Res<Time>, mut world: ResMut<GameWorld>) {
///     // ... work ...
/// }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        match syn::parse::<LitInt>(attr) {
            Ok(lit) => lit.base10_parse().unwrap_or(1),
            Err(err) => return err.to_compile_error().into(),
        }
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name_str = sig.ident.to_string();

    let tick = sig.inputs.iter().find_map(|arg| match arg {
        FnArg::Typed(pat_type) => frame_counter_param(pat_type),
        FnArg::Receiver(_) => None,
    });

    let guard = timer_guard(&fn_name_str, threshold_ms, tick.as_ref());

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_timer = {
                #guard
            };

            #block
        }
    };

    output.into()
}

/// `tick: Res<SimFrame>` (or any `tick` parameter whose type mentions
/// `SimFrame`).
fn frame_counter_param(pat_type: &PatType) -> Option<Ident> {
    let Pat::Ident(pat_ident) = &*pat_type.pat else {
        return None;
    };
    let ty = &pat_type.ty;
    let type_str = quote!(#ty).to_string();
    (pat_ident.ident == "tick" && type_str.contains("SimFrame")).then(|| pat_ident.ident.clone())
}

fn timer_guard(name: &str, threshold_ms: u128, tick: Option<&Ident>) -> TokenStream2 {
    let (tick_field, tick_check, tick_init) = match tick {
        Some(tick) => (
            quote! { frame: u64, },
            quote! { || self.frame % 100 == 0 },
            quote! { frame: #tick.0, },
        ),
        None => (quote! {}, quote! {}, quote! {}),
    };

    quote! {
        struct ProfileGuard {
            name: &'static str,
            start: std::time::Instant,
            #tick_field
        }
        impl Drop for ProfileGuard {
            fn drop(&mut self) {
                let elapsed = self.start.elapsed();
                if elapsed.as_millis() > #threshold_ms #tick_check {
                    bevy::prelude::info!("[PERF] {}: {:?}", self.name, elapsed);
                }
            }
        }
        ProfileGuard {
            name: #name,
            start: std::time::Instant::now(),
            #tick_init
        }
    }
}
