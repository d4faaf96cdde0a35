//! Fail-fast typed assertions.
//!
//! Every check converts both operands to one canonical type, compares them
//! with an [`Operator`], and on failure writes a single diagnostic line to
//! standard error and aborts the process. There is no recoverable variant:
//! the first broken check ends the whole run.
//!
//! # Families
//!
//! | Macros                                   | Canonical type      | Rendering                  |
//! |------------------------------------------|---------------------|----------------------------|
//! | `check_eq!` … `check_ge!`, `check_ok!`   | `i64`               | decimal                    |
//! | `check_u64_eq!` … `check_u64_ge!`        | `u64`               | decimal                    |
//! | `check_f64_eq!` … `check_f64_ge!`        | `f64`               | shortest round-trip        |
//! | `check_str_eq!`, `check_str_ne!`         | `&str`              | text                       |
//! | `check_mem_eq!`, `check_mem_ne!`         | first `size` bytes  | text, at most `size` bytes |
//! | `check_mem_hex_eq!`, `check_mem_hex_ne!` | first `size` bytes  | `01:02:0A`                 |
//! | `check_null!` … `check_ptr_lt!`          | address             | `0x7ffd…`                  |
//!
//! All of them funnel into the single generic [`check`], parameterised by
//! the operand type and its [`Render`] strategy. Use the hex family whenever
//! the compared bytes may not be printable.
//!
//! # Diagnostic format
//!
//! ```text
//! Assertion failed in tests/net.rs on line 42: `len + 1 == expected` (3 == 4)
//! Assertion failed in tests/net.rs on line 57: ready
//! Fatal error in tests/net.rs on line 63: socket closed
//! ```
//!
//! # Evaluation
//!
//! Each macro evaluates every operand expression exactly once, before the
//! comparison, so side-effecting operands behave as written and the
//! rendered values are the ones that were compared.

#[cfg(test)]
mod tests;

use std::fmt;
use std::io::{self, Write};
use std::process;

use tracing::error;

// ------------------------------------------------------------------------------------------------
// Location / Operator
// ------------------------------------------------------------------------------------------------

/// Source position of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Source file, as produced by `file!()`.
    pub file: &'static str,

    /// Line number, as produced by `line!()`.
    pub line: u32,
}

impl Location {
    /// Creates a location.
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }
}

/// Comparison operator of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl Operator {
    /// Source symbol of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }

    /// Returns `true` if `left <op> right` holds.
    ///
    /// Unordered operands (e.g. NaN) satisfy only `!=`.
    pub fn holds<T: PartialOrd + ?Sized>(self, left: &T, right: &T) -> bool {
        match self {
            Operator::Eq => left == right,
            Operator::Ne => left != right,
            Operator::Lt => left < right,
            Operator::Le => left <= right,
            Operator::Gt => left > right,
            Operator::Ge => left >= right,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ------------------------------------------------------------------------------------------------
// Rendering strategies
// ------------------------------------------------------------------------------------------------

/// How an operand value appears in a failure diagnostic.
pub trait Render {
    /// Writes the value.
    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

macro_rules! render_with_display {
    ($($ty:ty),*) => {
        $(impl Render for $ty {
            fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        })*
    };
}

render_with_display!(i64, u64, f64, &str);

/// Byte operand rendered as text.
///
/// Rendering stops at the first NUL byte; invalid UTF-8 is replaced with
/// `U+FFFD`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Text<'a>(pub &'a [u8]);

impl Render for Text<'_> {
    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(self.0.len());
        f.write_str(&String::from_utf8_lossy(&self.0[..end]))
    }
}

/// Byte operand rendered as colon-separated uppercase hex (`01:02:0A`).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Hex<'a>(pub &'a [u8]);

impl Render for Hex<'_> {
    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// Pointer operand reduced to its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Address(pub usize);

impl Address {
    /// The null address.
    pub const NULL: Address = Address(0);

    /// Address of anything pointer-like.
    pub fn of<P: AsAddress + ?Sized>(pointer: &P) -> Self {
        Address(pointer.address())
    }
}

impl Render for Address {
    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Pointer-like values whose address can be compared.
pub trait AsAddress {
    /// The address pointed to; `0` for null.
    fn address(&self) -> usize;
}

impl<T: ?Sized> AsAddress for *const T {
    fn address(&self) -> usize {
        self.cast::<()>() as usize
    }
}

impl<T: ?Sized> AsAddress for *mut T {
    fn address(&self) -> usize {
        self.cast::<()>() as usize
    }
}

impl<T: ?Sized> AsAddress for &T {
    fn address(&self) -> usize {
        (*self as *const T).address()
    }
}

impl<T: ?Sized> AsAddress for &mut T {
    fn address(&self) -> usize {
        (&**self as *const T).address()
    }
}

impl<T: ?Sized> AsAddress for std::ptr::NonNull<T> {
    fn address(&self) -> usize {
        self.as_ptr().address()
    }
}

impl<P: AsAddress> AsAddress for Option<P> {
    fn address(&self) -> usize {
        self.as_ref().map_or(0, AsAddress::address)
    }
}

/// Adapter turning a [`Render`] value into something `{}` can print.
struct Rendered<'a, T: ?Sized>(&'a T);

impl<T: Render + ?Sized> fmt::Display for Rendered<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.render(f)
    }
}

// ------------------------------------------------------------------------------------------------
// Failure descriptions
// ------------------------------------------------------------------------------------------------

/// Everything known about one comparison.
///
/// Its `Display` output is the diagnostic line printed on failure.
#[derive(Debug, Clone, Copy)]
pub struct Comparison<T> {
    /// Where the check was written.
    pub location: Location,

    /// Source text of the left operand.
    pub left_expr: &'static str,

    /// The operator.
    pub op: Operator,

    /// Source text of the right operand.
    pub right_expr: &'static str,

    /// Evaluated left operand.
    pub left: T,

    /// Evaluated right operand.
    pub right: T,
}

impl<T: PartialOrd> Comparison<T> {
    /// Returns `true` if the comparison holds.
    pub fn holds(&self) -> bool {
        self.op.holds(&self.left, &self.right)
    }
}

impl<T: Render> fmt::Display for Comparison<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Assertion failed in {} on line {}: `{} {} {}` ({} {} {})",
            self.location.file,
            self.location.line,
            self.left_expr,
            self.op,
            self.right_expr,
            Rendered(&self.left),
            self.op,
            Rendered(&self.right),
        )
    }
}

/// A failed boolean check.
#[derive(Debug, Clone, Copy)]
pub struct Expectation {
    /// Where the check was written.
    pub location: Location,

    /// Source text of the expression.
    pub expr: &'static str,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Assertion failed in {} on line {}: {}",
            self.location.file, self.location.line, self.expr
        )
    }
}

/// An unconditional failure with a caller-supplied message.
#[derive(Debug, Clone, Copy)]
pub struct FatalError<M> {
    /// Where the failure was raised.
    pub location: Location,

    /// What went wrong.
    pub message: M,
}

impl<M: fmt::Display> fmt::Display for FatalError<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fatal error in {} on line {}: {}",
            self.location.file, self.location.line, self.message
        )
    }
}

// ------------------------------------------------------------------------------------------------
// Checks
// ------------------------------------------------------------------------------------------------

/// Aborts the process unless `comparison` holds.
#[inline]
pub fn check<T: PartialOrd + Render>(comparison: Comparison<T>) {
    if !comparison.holds() {
        fail(&comparison);
    }
}

/// Aborts the process unless `value` is `true`.
#[inline]
pub fn check_true(location: Location, expr: &'static str, value: bool) {
    if !value {
        fail(&Expectation { location, expr });
    }
}

/// Converts the size operand of a memory check to a byte count.
///
/// Aborts the process if `size` is negative or does not fit in `usize`.
pub fn byte_count<S>(location: Location, expr: &'static str, size: S) -> usize
where
    S: Copy + fmt::Display,
    usize: TryFrom<S>,
{
    match usize::try_from(size) {
        Ok(count) => count,
        Err(_) => fail(&FatalError {
            location,
            message: format!("size `{expr}` is {size}, not a valid byte count"),
        }),
    }
}

/// Returns the first `size` bytes of `bytes`.
///
/// Aborts the process if `bytes` is shorter than `size`, naming the
/// offending operand.
pub fn prefix<'a>(location: Location, expr: &'static str, bytes: &'a [u8], size: usize) -> &'a [u8] {
    match bytes.get(..size) {
        Some(head) => head,
        None => fail(&FatalError {
            location,
            message: format!(
                "operand `{expr}` has {} bytes, fewer than the {size} compared",
                bytes.len()
            ),
        }),
    }
}

/// Writes `diagnostic` to standard error and aborts the process.
///
/// Standard error is flushed before aborting. Write errors are ignored:
/// the process terminates either way.
#[cold]
pub fn fail(diagnostic: &dyn fmt::Display) -> ! {
    let line = diagnostic.to_string();
    error!(diagnostic = %line, "assertion failure, aborting");

    let stderr = io::stderr();
    let mut err = stderr.lock();
    let _ = writeln!(err, "{line}");
    let _ = err.flush();

    process::abort()
}

// ------------------------------------------------------------------------------------------------
// Macros
// ------------------------------------------------------------------------------------------------

/// Shared expansion of the typed comparison macros.
#[doc(hidden)]
#[macro_export]
macro_rules! __check_cmp {
    // Numeric families: cast to the canonical type.
    (@cast $ty:ty, $left:expr, $op:ident, $right:expr) => {{
        #[allow(clippy::unnecessary_cast, trivial_numeric_casts)]
        let left = ($left) as $ty;
        #[allow(clippy::unnecessary_cast, trivial_numeric_casts)]
        let right = ($right) as $ty;
        $crate::assert::check($crate::assert::Comparison {
            location: $crate::assert::Location::new(::core::file!(), ::core::line!()),
            left_expr: ::core::stringify!($left),
            op: $crate::assert::Operator::$op,
            right_expr: ::core::stringify!($right),
            left,
            right,
        });
    }};
    // Strings: compare full content.
    (@str $left:expr, $op:ident, $right:expr) => {{
        let left_value = $left;
        let right_value = $right;
        $crate::assert::check($crate::assert::Comparison {
            location: $crate::assert::Location::new(::core::file!(), ::core::line!()),
            left_expr: ::core::stringify!($left),
            op: $crate::assert::Operator::$op,
            right_expr: ::core::stringify!($right),
            left: ::core::convert::AsRef::<str>::as_ref(&left_value),
            right: ::core::convert::AsRef::<str>::as_ref(&right_value),
        });
    }};
    // Bounded memory: compare exactly `size` bytes, render with `$style`.
    (@mem $style:ident, $left:expr, $op:ident, $right:expr, $size:expr) => {{
        let location = $crate::assert::Location::new(::core::file!(), ::core::line!());
        let left_value = $left;
        let right_value = $right;
        let size = $crate::assert::byte_count(location, ::core::stringify!($size), $size);
        let left = $crate::assert::prefix(
            location,
            ::core::stringify!($left),
            ::core::convert::AsRef::<[u8]>::as_ref(&left_value),
            size,
        );
        let right = $crate::assert::prefix(
            location,
            ::core::stringify!($right),
            ::core::convert::AsRef::<[u8]>::as_ref(&right_value),
            size,
        );
        $crate::assert::check($crate::assert::Comparison {
            location,
            left_expr: ::core::stringify!($left),
            op: $crate::assert::Operator::$op,
            right_expr: ::core::stringify!($right),
            left: $crate::assert::$style(left),
            right: $crate::assert::$style(right),
        });
    }};
    // Pointers: compare addresses.
    (@ptr $left:expr, $op:ident, $right:expr) => {{
        let left_value = $left;
        let right_value = $right;
        $crate::assert::check($crate::assert::Comparison {
            location: $crate::assert::Location::new(::core::file!(), ::core::line!()),
            left_expr: ::core::stringify!($left),
            op: $crate::assert::Operator::$op,
            right_expr: ::core::stringify!($right),
            left: $crate::assert::Address::of(&left_value),
            right: $crate::assert::Address::of(&right_value),
        });
    }};
    (@null $value:expr, $op:ident) => {{
        let value = $value;
        $crate::assert::check($crate::assert::Comparison {
            location: $crate::assert::Location::new(::core::file!(), ::core::line!()),
            left_expr: ::core::stringify!($value),
            op: $crate::assert::Operator::$op,
            right_expr: "null",
            left: $crate::assert::Address::of(&value),
            right: $crate::assert::Address::NULL,
        });
    }};
}

/// Aborts unless the boolean expression is `true`.
#[macro_export]
macro_rules! check {
    ($cond:expr $(,)?) => {
        $crate::assert::check_true(
            $crate::assert::Location::new(::core::file!(), ::core::line!()),
            ::core::stringify!($cond),
            $cond,
        )
    };
}

/// Aborts unconditionally with a message.
///
/// Accepts a single displayable value or a format string with arguments.
#[macro_export]
macro_rules! fatal {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::assert::fail(&$crate::assert::FatalError {
            location: $crate::assert::Location::new(::core::file!(), ::core::line!()),
            message: ::core::format_args!($fmt $(, $arg)*),
        })
    };
    ($msg:expr $(,)?) => {
        $crate::assert::fail(&$crate::assert::FatalError {
            location: $crate::assert::Location::new(::core::file!(), ::core::line!()),
            message: $msg,
        })
    };
}

/// Signed 64-bit `left == right`.
#[macro_export]
macro_rules! check_eq {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast i64, $left, Eq, $right) };
}

/// Signed 64-bit `left != right`.
#[macro_export]
macro_rules! check_ne {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast i64, $left, Ne, $right) };
}

/// Signed 64-bit `left < right`.
#[macro_export]
macro_rules! check_lt {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast i64, $left, Lt, $right) };
}

/// Signed 64-bit `left <= right`.
#[macro_export]
macro_rules! check_le {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast i64, $left, Le, $right) };
}

/// Signed 64-bit `left > right`.
#[macro_export]
macro_rules! check_gt {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast i64, $left, Gt, $right) };
}

/// Signed 64-bit `left >= right`.
#[macro_export]
macro_rules! check_ge {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast i64, $left, Ge, $right) };
}

/// Status code is zero.
#[macro_export]
macro_rules! check_ok {
    ($status:expr $(,)?) => { $crate::__check_cmp!(@cast i64, $status, Eq, 0) };
}

/// Unsigned 64-bit `left == right`.
#[macro_export]
macro_rules! check_u64_eq {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast u64, $left, Eq, $right) };
}

/// Unsigned 64-bit `left != right`.
#[macro_export]
macro_rules! check_u64_ne {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast u64, $left, Ne, $right) };
}

/// Unsigned 64-bit `left < right`.
#[macro_export]
macro_rules! check_u64_lt {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast u64, $left, Lt, $right) };
}

/// Unsigned 64-bit `left <= right`.
#[macro_export]
macro_rules! check_u64_le {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast u64, $left, Le, $right) };
}

/// Unsigned 64-bit `left > right`.
#[macro_export]
macro_rules! check_u64_gt {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast u64, $left, Gt, $right) };
}

/// Unsigned 64-bit `left >= right`.
#[macro_export]
macro_rules! check_u64_ge {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast u64, $left, Ge, $right) };
}

/// Double precision `left == right`.
#[macro_export]
macro_rules! check_f64_eq {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast f64, $left, Eq, $right) };
}

/// Double precision `left != right`.
#[macro_export]
macro_rules! check_f64_ne {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast f64, $left, Ne, $right) };
}

/// Double precision `left < right`.
#[macro_export]
macro_rules! check_f64_lt {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast f64, $left, Lt, $right) };
}

/// Double precision `left <= right`.
#[macro_export]
macro_rules! check_f64_le {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast f64, $left, Le, $right) };
}

/// Double precision `left > right`.
#[macro_export]
macro_rules! check_f64_gt {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast f64, $left, Gt, $right) };
}

/// Double precision `left >= right`.
#[macro_export]
macro_rules! check_f64_ge {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@cast f64, $left, Ge, $right) };
}

/// String contents are equal.
#[macro_export]
macro_rules! check_str_eq {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@str $left, Eq, $right) };
}

/// String contents differ.
#[macro_export]
macro_rules! check_str_ne {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@str $left, Ne, $right) };
}

/// First `size` bytes are equal; mismatches are rendered as text.
#[macro_export]
macro_rules! check_mem_eq {
    ($left:expr, $right:expr, $size:expr $(,)?) => {
        $crate::__check_cmp!(@mem Text, $left, Eq, $right, $size)
    };
}

/// First `size` bytes differ; equal operands are rendered as text.
#[macro_export]
macro_rules! check_mem_ne {
    ($left:expr, $right:expr, $size:expr $(,)?) => {
        $crate::__check_cmp!(@mem Text, $left, Ne, $right, $size)
    };
}

/// First `size` bytes are equal; mismatches are rendered as hex.
#[macro_export]
macro_rules! check_mem_hex_eq {
    ($left:expr, $right:expr, $size:expr $(,)?) => {
        $crate::__check_cmp!(@mem Hex, $left, Eq, $right, $size)
    };
}

/// First `size` bytes differ; equal operands are rendered as hex.
#[macro_export]
macro_rules! check_mem_hex_ne {
    ($left:expr, $right:expr, $size:expr $(,)?) => {
        $crate::__check_cmp!(@mem Hex, $left, Ne, $right, $size)
    };
}

/// Pointer is null.
#[macro_export]
macro_rules! check_null {
    ($ptr:expr $(,)?) => { $crate::__check_cmp!(@null $ptr, Eq) };
}

/// Pointer is not null.
#[macro_export]
macro_rules! check_not_null {
    ($ptr:expr $(,)?) => { $crate::__check_cmp!(@null $ptr, Ne) };
}

/// Pointers address the same location.
#[macro_export]
macro_rules! check_ptr_eq {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@ptr $left, Eq, $right) };
}

/// Pointers address different locations.
#[macro_export]
macro_rules! check_ptr_ne {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@ptr $left, Ne, $right) };
}

/// Left pointer addresses a lower location than the right one.
#[macro_export]
macro_rules! check_ptr_lt {
    ($left:expr, $right:expr $(,)?) => { $crate::__check_cmp!(@ptr $left, Lt, $right) };
}
