use super::Type;

#[macro_export]
macro_rules! nil_t {
    () => {
        Type::Nil
    };
}
#[macro_export]
macro_rules! boolean_t {
    () => {
        Type::Boolean
    };
}
#[macro_export]
macro_rules! integer_t {
    () => {
        Type::Integer
    };
}
#[macro_export]
macro_rules! float_t {
    () => {
        Type::Float
    };
}
#[macro_export]
macro_rules! string_t {
    () => {
        Type::String
    };
}
#[macro_export]
macro_rules! any_t {
    () => {
        Type::Any
    };
}
#[macro_export]
macro_rules! array_t {
    ($elem:expr) => {
        Type::Array($elem.into_id())
    };
}
#[macro_export]
macro_rules! function_t {
    ($params:expr, $rets:expr) => {
        Type::Function(
            $params.into_iter().map(Type::into_id).collect(),
            $rets.into_iter().map(Type::into_id).collect(),
        )
    };
}

#[cfg(test)]
mod typemacro_test {
    use super::*;

    #[test]
    fn buildertest() {
        let t = function_t!(vec![integer_t!(), array_t!(float_t!())], vec![any_t!()]);
        let answer = Type::Function(
            vec![
                Type::Integer.into_id(),
                Type::Array(Type::Float.into_id()).into_id(),
            ],
            vec![Type::Any.into_id()],
        );
        assert_eq!(t, answer);
    }
}
