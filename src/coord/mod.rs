//! Cross-task coordination: the link set shared by all tasks and the mood
//! coordinator. The storage and network coordinators live next to their
//! domains in [`crate::frames`] and [`crate::advisory`].

pub mod channels;
pub mod mood_task;
