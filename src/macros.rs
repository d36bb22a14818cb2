/// Build a [`Rule`](crate::Rule).
///
/// ```
/// use lexmap::{rule, Rule, Sides};
///
/// let split = rule!(split "alpha", [LEFT, MIDDLE, RIGHT]);
/// assert_eq!(split, Rule::Split { pattern: "alpha".into(), sides: Sides::all() });
///
/// let token = rule!(token "colour" => "color");
/// assert_eq!(token.to_line(), "r\tcolor\tcolour\n");
///
/// let ch = rule!(char 'f' => 't');
/// assert_eq!(ch.to_line(), "c\tt\tf\n");
/// ```
#[macro_export]
macro_rules! rule {
    (split $pattern:expr, [ $($side:ident),+ $(,)? ]) => {
        $crate::Rule::Split {
            pattern: ::std::string::String::from($pattern),
            sides: $crate::Sides::empty() $(| $crate::Sides::$side)+,
        }
    };
    (token $pattern:expr => $target:expr) => {
        $crate::Rule::ReplaceToken {
            pattern: ::std::string::String::from($pattern),
            target: ::std::string::String::from($target),
        }
    };
    (char $pattern:expr => $target:expr) => {
        $crate::Rule::ReplaceCharacter { pattern: $pattern, target: $target }
    };
}
