/// Declares record identifiers as integer newtypes.
///
/// Every id in the timetable domain (timetables, classes, teachers, rooms,
/// users, ...) is an `i64` key handed out by the store. Wrapping each in its
/// own type keeps a `TeacherId` from being passed where a `ClassroomId` is
/// expected, while the JSON form stays a bare number (`"teacher": 7`).
///
/// Each generated type is `Copy`, ordered and hashable, prints as its number
/// and converts to and from the inner integer.
///
/// ```
/// timetable_backend::define_id_type!(i64 => RoomKey, SlotKey);
///
/// let room = RoomKey::from(12);
/// assert_eq!(room.to_string(), "12");
/// assert_eq!(serde_json::to_string(&room).unwrap(), "12");
/// assert_eq!(i64::from(SlotKey(3)), 3);
/// ```
#[macro_export]
macro_rules! define_id_type {
    ($inner:ty => $($name:ident),+ $(,)?) => {
        $(
            #[derive(
                Debug,
                Copy,
                Clone,
                PartialEq,
                Eq,
                PartialOrd,
                Ord,
                Hash,
                serde::Serialize,
                serde::Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub $inner);

            impl ::std::fmt::Display for $name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    ::std::fmt::Display::fmt(&self.0, f)
                }
            }

            impl ::std::convert::From<$inner> for $name {
                fn from(raw: $inner) -> Self {
                    $name(raw)
                }
            }

            impl ::std::convert::From<$name> for $inner {
                fn from(id: $name) -> Self {
                    id.0
                }
            }
        )+
    };
}
