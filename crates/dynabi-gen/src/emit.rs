//! Code emission.
//!
//! Output is deterministic: declarations emit in source order with no
//! timestamps or environment-dependent content, so regenerating from
//! unchanged input reproduces the file byte for byte.

use std::fmt::Write;

use crate::parse::{ArgDecl, FuncDecl};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgClass {
    /// Already a `u64`, no conversion.
    PassThrough,
    /// Integer narrower than or equal to the word, `as u64`.
    IntCast,
    Bool,
    /// Raw pointer, `as u64` plus a keep-reachable statement after the
    /// call so the pointee cannot be collected while the address is in
    /// flight.
    Pointer,
    Float32,
    Float64,
    /// Unknown spelling; converted `as u64` on a best-effort basis.
    Opaque,
}

fn classify(ty: &str) -> ArgClass {
    match ty.trim() {
        "u64" => ArgClass::PassThrough,
        "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "usize" | "isize" => {
            ArgClass::IntCast
        }
        "bool" => ArgClass::Bool,
        "f32" => ArgClass::Float32,
        "f64" => ArgClass::Float64,
        t if t.starts_with('*') => ArgClass::Pointer,
        _ => ArgClass::Opaque,
    }
}

/// Conversion of one declared argument into its integer register word.
fn conv(arg: &ArgDecl) -> String {
    match classify(&arg.ty) {
        ArgClass::PassThrough => arg.name.clone(),
        ArgClass::Float32 => format!("{}.to_bits() as u64", arg.name),
        ArgClass::Float64 => format!("{}.to_bits()", arg.name),
        _ => format!("{} as u64", arg.name),
    }
}

/// Conversion of the raw return word `_r` back to the declared type.
fn ret_expr(ty: &str) -> String {
    match classify(ty) {
        ArgClass::PassThrough => "_r".to_string(),
        ArgClass::Bool => "_r as u8 != 0".to_string(),
        ArgClass::Float32 => "f32::from_bits(_r as u32)".to_string(),
        ArgClass::Float64 => "f64::from_bits(_r)".to_string(),
        _ => format!("_r as {ty}"),
    }
}

/// Float-register arities get an exact float primitive when the whole
/// shape is homogeneous; everything else goes through the word path.
fn float_family(d: &FuncDecl) -> Option<&'static str> {
    if d.args.len() > 3 {
        return None;
    }
    match d.ret.as_deref() {
        Some("f64") if d.args.iter().all(|a| classify(&a.ty) == ArgClass::Float64) => {
            Some("call_double")
        }
        Some("f32") if d.args.iter().all(|a| classify(&a.ty) == ArgClass::Float32) => {
            Some("call_float")
        }
        _ => None,
    }
}

fn addr_name(d: &FuncDecl) -> String {
    format!("{}_ADDR", d.var_name.to_uppercase())
}

fn thunk_name(d: &FuncDecl) -> String {
    format!("{}_thunk", d.var_name.to_lowercase())
}

pub(crate) fn emit(decls: &[FuncDecl]) -> String {
    // Generated item names fold case, so two statics differing only in
    // case would emit colliding items. First declaration wins.
    let mut seen = std::collections::HashSet::new();
    let mut kept: Vec<&FuncDecl> = Vec::new();
    for d in decls {
        if seen.insert(thunk_name(d)) {
            kept.push(d);
        } else {
            log::warn!(
                "skipping '{}': generated name '{}' collides with an earlier declaration",
                d.var_name,
                thunk_name(d)
            );
        }
    }

    let mut out = String::new();
    out.push_str("// @generated by dynabi-gen. DO NOT EDIT.\n\n");
    out.push_str("use std::sync::atomic::{AtomicU64, Ordering};\n");
    for d in &kept {
        out.push('\n');
        emit_decl(&mut out, d);
    }
    if !kept.is_empty() {
        out.push('\n');
        emit_bind_all(&mut out, &kept);
    }
    out
}

fn emit_decl(out: &mut String, d: &FuncDecl) {
    let addr = addr_name(d);
    let _ = writeln!(out, "static {addr}: AtomicU64 = AtomicU64::new(0);");
    out.push('\n');

    let params: Vec<String> = d
        .args
        .iter()
        .map(|a| format!("{}: {}", a.name, a.ty))
        .collect();
    let ret_ann = match &d.ret {
        Some(r) => format!(" -> {r}"),
        None => String::new(),
    };
    let _ = writeln!(
        out,
        "pub unsafe extern \"C\" fn {}({}){} {{",
        thunk_name(d),
        params.join(", "),
        ret_ann
    );

    if let Some(family) = float_family(d) {
        let names: Vec<&str> = d.args.iter().map(|a| a.name.as_str()).collect();
        let sep = if names.is_empty() { "" } else { ", " };
        let _ = writeln!(
            out,
            "    dynabi::{family}{}({addr}.load(Ordering::Relaxed){sep}{})",
            d.args.len(),
            names.join(", ")
        );
    } else {
        let words: Vec<String> = d.args.iter().map(conv).collect();
        let call = if d.args.len() <= 15 {
            let sep = if words.is_empty() { "" } else { ", " };
            format!(
                "dynabi::call{}({addr}.load(Ordering::Relaxed){sep}{})",
                d.args.len(),
                words.join(", ")
            )
        } else {
            format!(
                "dynabi::call_n({addr}.load(Ordering::Relaxed), &[{}]).0",
                words.join(", ")
            )
        };
        if d.ret.is_some() {
            let _ = writeln!(out, "    let _r = {call};");
        } else {
            let _ = writeln!(out, "    {call};");
        }
        for a in &d.args {
            if classify(&a.ty) == ArgClass::Pointer {
                let _ = writeln!(out, "    std::hint::black_box({});", a.name);
            }
        }
        if let Some(r) = &d.ret {
            let _ = writeln!(out, "    {}", ret_expr(r));
        }
    }
    out.push_str("}\n");
}

fn emit_bind_all(out: &mut String, decls: &[&FuncDecl]) {
    let mut libs: Vec<&str> = Vec::new();
    for d in decls {
        if !libs.contains(&d.lib_var.as_str()) {
            libs.push(&d.lib_var);
        }
    }
    let params: Vec<String> = libs
        .iter()
        .map(|l| format!("{}: &dynabi::NativeLibrary", l.to_lowercase()))
        .collect();

    out.push_str("/// Resolve every generated symbol and publish the thunks.\n");
    out.push_str("///\n");
    out.push_str("/// # Safety\n");
    out.push_str("///\n");
    out.push_str("/// Must not race with calls through the generated statics.\n");
    let _ = writeln!(
        out,
        "pub unsafe fn bind_all({}) -> Result<(), dynabi::LoadError> {{",
        params.join(", ")
    );
    for d in decls {
        let _ = writeln!(
            out,
            "    {}.store({}.symbol_addr(\"{}\")?, Ordering::Relaxed);",
            addr_name(d),
            d.lib_var.to_lowercase(),
            d.sym_name
        );
        if d.has_slot {
            let _ = writeln!(out, "    {} = Some({});", d.var_name, thunk_name(d));
        }
    }
    out.push_str("    Ok(())\n}\n");
}
