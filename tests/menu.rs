mod tests {
    use myrtio_light_painter::{Input, MenuEffect, MenuItem, MenuState, transition};

    /// Feed `inputs` from `state`, collecting effects
    fn press(mut state: MenuState, inputs: &[Input]) -> (MenuState, Vec<MenuEffect>) {
        let mut effects = Vec::new();
        for &input in inputs {
            let (next, effect) = transition(state, input);
            state = next;
            effects.push(effect);
        }
        (state, effects)
    }

    #[test]
    fn test_browse_wraps_around() {
        let mut item = MenuItem::Start;
        for _ in 0..MenuItem::ALL.len() {
            item = item.next();
        }
        assert_eq!(item, MenuItem::Start);
        assert_eq!(MenuItem::Start.previous(), MenuItem::SaveConfig);

        let (state, effects) = press(MenuState::INITIAL, &[Input::Previous]);
        assert_eq!(state, MenuState::Browse(MenuItem::SaveConfig));
        assert_eq!(effects, [MenuEffect::None]);
    }

    #[test]
    fn test_start_and_stop() {
        let (state, effects) = press(MenuState::INITIAL, &[Input::Select]);
        assert_eq!(state, MenuState::Playing);
        assert_eq!(effects, [MenuEffect::Play]);

        let (state, effects) = press(state, &[Input::Next, Input::Back]);
        assert_eq!(state, MenuState::INITIAL);
        assert_eq!(effects, [MenuEffect::None, MenuEffect::Stop]);
    }

    #[test]
    fn test_edit_speed() {
        let (state, effects) = press(
            MenuState::Browse(MenuItem::Speed),
            &[Input::Select, Input::Next, Input::Next, Input::Previous, Input::Back],
        );
        assert_eq!(state, MenuState::Browse(MenuItem::Speed));
        assert_eq!(
            effects,
            [
                MenuEffect::None,
                MenuEffect::Adjust(MenuItem::Speed, 1),
                MenuEffect::Adjust(MenuItem::Speed, 1),
                MenuEffect::Adjust(MenuItem::Speed, -1),
                MenuEffect::None,
            ]
        );
    }

    #[test]
    fn test_brightness_asks_for_rescan() {
        let start = MenuState::Browse(MenuItem::Brightness);
        let (state, effects) = press(start, &[Input::Select, Input::Previous, Input::Select]);
        assert_eq!(state, MenuState::ConfirmRescan);
        assert_eq!(
            effects,
            [
                MenuEffect::BeginBrightness,
                MenuEffect::Adjust(MenuItem::Brightness, -1),
                MenuEffect::CommitBrightness,
            ]
        );

        assert_eq!(transition(state, Input::Next), (start, MenuEffect::Rescan));
        assert_eq!(transition(state, Input::Previous), (start, MenuEffect::None));
        assert_eq!(transition(state, Input::Select), (state, MenuEffect::None));
    }

    #[test]
    fn test_save_config_prompt() {
        let start = MenuState::Browse(MenuItem::SaveConfig);
        let (state, effects) = press(start, &[Input::Select, Input::Next]);
        assert_eq!(state, MenuState::Saved);
        assert_eq!(effects, [MenuEffect::None, MenuEffect::SaveConfig]);
        assert_eq!(transition(state, Input::Select), (start, MenuEffect::None));

        let (state, effects) = press(start, &[Input::Select, Input::Back]);
        assert_eq!(state, start);
        assert_eq!(effects, [MenuEffect::None, MenuEffect::None]);
    }

    #[test]
    fn test_labels_fit_display() {
        let states = MenuItem::ALL
            .iter()
            .flat_map(|&item| [MenuState::Browse(item), MenuState::Edit(item)])
            .chain([
                MenuState::ConfirmSave,
                MenuState::ConfirmRescan,
                MenuState::Saved,
                MenuState::Playing,
            ]);
        for state in states {
            for line in state.label() {
                assert!(line.len() <= 16, "{line:?} too long");
            }
        }
        assert_eq!(MenuState::default(), MenuState::INITIAL);
    }
}
