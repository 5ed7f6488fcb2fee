extern crate rmp_serde;
extern crate serde;
extern crate serde_json;

#[allow(dead_code)]
pub fn test_serde<T>(value: T)
    where T: ::std::fmt::Debug + serde::Serialize + serde::de::DeserializeOwned + PartialEq
{
    let json = serde_json::to_string(&value).unwrap();
    let value2 = serde_json::from_str(&json).unwrap();
    assert_eq!(value, value2);

    let msgpack = rmp_serde::to_vec(&value).unwrap();
    let value3 = rmp_serde::from_slice(&msgpack).unwrap();
    assert_eq!(value, value3);
}

#[allow(dead_code)]
pub fn via_json<T>(value: &T) -> T
    where T: serde::Serialize + serde::de::DeserializeOwned
{
    let json = serde_json::to_string(value).unwrap();
    serde_json::from_str(&json).unwrap()
}

#[allow(dead_code)]
pub fn via_msgpack<T>(value: &T) -> T
    where T: serde::Serialize + serde::de::DeserializeOwned
{
    let msgpack = rmp_serde::to_vec(value).unwrap();
    rmp_serde::from_slice(&msgpack).unwrap()
}
